use chrono::{DateTime, Utc};
use meridian_analytics::backtest::{BreachStats, HitRateStats};
use meridian_analytics::vwap::VwapValue;
use meridian_core::market::entity::Anchor;
use meridian_core::store::entity::KpiSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 看板 KPI 标识，同时作为快照的 `kpi_id`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiId {
    Atr,
    Adx,
    RealizedVol,
    ParkinsonVol,
    SessionVwap,
    AvwapSwing,
    AvwapMonth,
    AvwapEvent,
    ExpectedMove,
    EmHitRate,
    EmBreachTiming,
    StrikeMap,
}

impl KpiId {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiId::Atr => "atr",
            KpiId::Adx => "adx",
            KpiId::RealizedVol => "realized_vol",
            KpiId::ParkinsonVol => "parkinson_vol",
            KpiId::SessionVwap => "session_vwap",
            KpiId::AvwapSwing => "avwap_swing",
            KpiId::AvwapMonth => "avwap_month",
            KpiId::AvwapEvent => "avwap_event",
            KpiId::ExpectedMove => "expected_move",
            KpiId::EmHitRate => "em_hit_rate",
            KpiId::EmBreachTiming => "em_breach_timing",
            KpiId::StrikeMap => "strike_map",
        }
    }

    /// 依赖期权快照或隐含波动率序列的 KPI，拉取失败时只降级这些
    pub fn is_option_derived(&self) -> bool {
        matches!(
            self,
            KpiId::ExpectedMove | KpiId::EmHitRate | KpiId::EmBreachTiming | KpiId::StrikeMap
        )
    }
}

impl fmt::Display for KpiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtrKpi {
    pub period: usize,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxKpi {
    pub period: usize,
    pub adx: Option<f64>,
    #[serde(rename = "diPlus")]
    pub di_plus: Option<f64>,
    #[serde(rename = "diMinus")]
    pub di_minus: Option<f64>,
}

/// 年化波动率 (小数)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityKpi {
    pub window: usize,
    #[serde(rename = "periodsPerYear")]
    pub periods_per_year: f64,
    pub value: Option<f64>,
}

/// # Summary
/// 会话 VWAP 或锚定 VWAP 的结果。
///
/// # Invariants
/// - `distance` 为最新收盘价相对 VWAP 的小数距离，任一端缺失时为 None。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VwapKpi {
    pub anchor: Option<Anchor>,
    pub vwap: Option<VwapValue>,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRateKpi {
    #[serde(rename = "horizonDays")]
    pub horizon_days: usize,
    #[serde(rename = "lookbackDays")]
    pub lookback_days: usize,
    #[serde(flatten)]
    pub stats: HitRateStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreachKpi {
    #[serde(rename = "horizonDays")]
    pub horizon_days: usize,
    #[serde(rename = "lookbackDays")]
    pub lookback_days: usize,
    #[serde(flatten)]
    pub stats: BreachStats,
}

/// # Summary
/// 一次 KPI 计算的汇总结果。
///
/// # Invariants
/// - `snapshots` 中的每一条都已写入快照存储，`kpi_id` 在本次运行内唯一。
/// - `degraded` 列出因期权数据拉取失败而未产出的 KPI。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiReport {
    pub run_id: String,
    pub symbol: String,
    pub computed_at: DateTime<Utc>,
    // 归一化后的 K 线数量
    pub candles: usize,
    pub last_close: Option<f64>,
    pub snapshots: Vec<KpiSnapshot>,
    pub degraded: Vec<KpiId>,
}

impl KpiReport {
    /// 按 KPI 取出本次运行的负载
    pub fn payload(&self, id: KpiId) -> Option<&serde_json::Value> {
        self.snapshots
            .iter()
            .find(|s| s.kpi_id == id.as_str())
            .map(|s| &s.payload)
    }
}
