use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 一次 KPI 计算产出的单条快照负载，交由持久层保存。
///
/// # Invariants
/// - `(run_id, kpi_id)` 在同一次运行内唯一。
/// - `payload` 是已计算完成的数值记录，内核不会再回读它。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiSnapshot {
    // 运行批次 ID
    pub run_id: String,
    // KPI 标识，例如 "atr"、"strike_map"
    pub kpi_id: String,
    pub symbol: String,
    pub computed_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}
