use meridian_core::analytics::error::AnalyticsError;
use meridian_core::market::error::MarketError;
use meridian_core::store::error::StoreError;
use thiserror::Error;

/// # Summary
/// 服务层的统一错误类型。
///
/// # Invariants
/// - 期权数据拉取失败不会出现在这里，只会让对应 KPI 降级。
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Market error: {0}")]
    Market(#[from] MarketError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    // 快照写入中途失败，`appended` 条已按 `run_id` 写入
    #[error("Persist error for run {run_id}: {appended} of {total} snapshots written: {source}")]
    Persist {
        run_id: String,
        appended: usize,
        total: usize,
        source: StoreError,
    },
    // 历史窗口天数超出可表示的时间范围
    #[error("History window of {0} days is out of range")]
    HistoryWindow(i64),
    // KPI 负载无法序列化为 JSON
    #[error("Serialize error: {0}")]
    Serialize(String),
}
