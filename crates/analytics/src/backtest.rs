use chrono::NaiveDate;
use chrono_tz::Tz;
use meridian_core::analytics::error::AnalyticsError;
use meridian_core::market::entity::{Candle, IvPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::expected_move::em_abs_from_spot_iv;
use crate::num::count_f64;

/// # Summary
/// 合并后的单日观测。
///
/// # Invariants
/// - `iv` 为小数形式的年化隐含波动率。
/// - 任一字段缺失表示该日在对应序列中不存在 (缺失连接键)。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub day: NaiveDate,
    pub spot: Option<f64>,
    pub iv: Option<f64>,
}

/// 回测参数，两个值都必须不小于 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestParams {
    pub horizon_days: usize,
    pub lookback_days: usize,
}

/// # Summary
/// 命中率统计。`hit_rate` 为百分比，`total` 为 0 时为 NaN。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRateStats {
    pub hits: usize,
    pub total: usize,
    #[serde(rename = "hitRate")]
    pub hit_rate: f64,
}

/// # Summary
/// 首次突破时间统计。
///
/// # Invariants
/// - `avg_breach_fraction` 只对发生突破的起点求平均，没有突破时为 NaN。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreachStats {
    pub breached: usize,
    #[serde(rename = "notBreached")]
    pub not_breached: usize,
    #[serde(rename = "avgBreachFraction")]
    pub avg_breach_fraction: f64,
}

/// # Summary
/// 以参考时区的自然日为键，外连接现价与隐含波动率序列。
///
/// # Logic
/// 1. 现价取每日最后一根 K 线的收盘价。
/// 2. 隐含波动率取每日最后一个有限正值，并由百分点转换为小数。
/// 3. 结果按日期升序排列。
pub fn merge_daily(candles: &[Candle], iv_points: &[IvPoint], tz: Tz) -> Vec<DailyObservation> {
    let day_of = |ts: i64| {
        chrono::DateTime::from_timestamp_millis(ts).map(|t| t.with_timezone(&tz).date_naive())
    };
    let mut days: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();

    let mut sorted_candles: Vec<&Candle> = candles.iter().collect();
    sorted_candles.sort_by_key(|c| c.timestamp);
    for c in sorted_candles {
        if let Some(day) = day_of(c.timestamp) {
            if c.close.is_finite() && c.close > 0.0 {
                days.entry(day).or_default().0 = Some(c.close);
            }
        }
    }

    let mut sorted_iv: Vec<&IvPoint> = iv_points.iter().collect();
    sorted_iv.sort_by_key(|p| p.timestamp);
    for p in sorted_iv {
        if !(p.percent_value.is_finite() && p.percent_value > 0.0) {
            continue;
        }
        if let Some(day) = day_of(p.timestamp) {
            days.entry(day).or_default().1 = Some(p.percent_value / 100.0);
        }
    }

    days.into_iter()
        .map(|(day, (spot, iv))| DailyObservation { day, spot, iv })
        .collect()
}

fn validate(params: BacktestParams) -> Result<(), AnalyticsError> {
    if params.horizon_days < 1 {
        return Err(AnalyticsError::InvalidParameter {
            name: "horizonDays",
            reason: "must be at least 1".to_string(),
        });
    }
    if params.lookback_days < 1 {
        return Err(AnalyticsError::InvalidParameter {
            name: "lookbackDays",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// 一个可评估的起点：起点现价、预期波动、终点现价
struct Start {
    index: usize,
    spot: f64,
    em: f64,
    end_spot: f64,
}

/// # Summary
/// 枚举回看窗口内的可评估起点。
///
/// # Logic
/// 1. 只使用合并序列最近的 `lookback + h + 1` 天。
/// 2. `maxStart = n − h`，起点范围 `[max(0, maxStart − lookback), maxStart)`。
/// 3. 起点缺少现价或隐含波动率、终点缺少现价的日子跳过，不计入命中也不计入未命中。
fn eligible_starts(series: &[DailyObservation], params: BacktestParams) -> (Vec<Start>, &[DailyObservation]) {
    let h = params.horizon_days;
    let keep = params.lookback_days + h + 1;
    let window = &series[series.len().saturating_sub(keep)..];

    let Some(max_start) = window.len().checked_sub(h) else {
        return (Vec::new(), window);
    };
    let min_start = max_start.saturating_sub(params.lookback_days);
    let horizon = count_f64(h);

    let starts = (min_start..max_start)
        .filter_map(|i| {
            let start = &window[i];
            let spot = start.spot?;
            let em = em_abs_from_spot_iv(spot, start.iv?, horizon)?;
            let end_spot = window[i + h].spot?;
            Some(Start {
                index: i,
                spot,
                em,
                end_spot,
            })
        })
        .collect();
    (starts, window)
}

/// # Summary
/// 预期波动命中率：持有 h 天后的实际波动不超过预期波动即为命中。
///
/// # Arguments
/// * `series`: `merge_daily` 的输出。
/// * `params`: 期限与回看天数。
///
/// # Returns
/// 参数非法时返回 `InvalidParameter`。
pub fn hit_rate(series: &[DailyObservation], params: BacktestParams) -> Result<HitRateStats, AnalyticsError> {
    validate(params)?;
    let (starts, _) = eligible_starts(series, params);
    let total = starts.len();
    let hits = starts
        .iter()
        .filter(|s| (s.end_spot - s.spot).abs() <= s.em)
        .count();
    let hit_rate = if total == 0 {
        f64::NAN
    } else {
        count_f64(hits) / count_f64(total) * 100.0
    };
    Ok(HitRateStats { hits, total, hit_rate })
}

/// # Summary
/// 首次突破时间。
///
/// # Logic
/// 1. 对每个可评估起点向前走最多 h 步，缺少现价的日子跳过。
/// 2. 第一个实际波动严格超过预期波动的步数即突破步，记录 `step / h`。
/// 3. 只对发生突破的起点求平均。
pub fn time_to_first_breach(
    series: &[DailyObservation],
    params: BacktestParams,
) -> Result<BreachStats, AnalyticsError> {
    validate(params)?;
    let h = params.horizon_days;
    let (starts, window) = eligible_starts(series, params);

    let mut fractions = Vec::new();
    for s in &starts {
        let breach_step = (1..=h).find(|step| {
            window[s.index + step]
                .spot
                .map(|spot| (spot - s.spot).abs() > s.em)
                .unwrap_or(false)
        });
        if let Some(step) = breach_step {
            fractions.push(count_f64(step) / count_f64(h));
        }
    }

    let breached = fractions.len();
    let avg_breach_fraction = if breached == 0 {
        f64::NAN
    } else {
        fractions.iter().sum::<f64>() / count_f64(breached)
    };
    Ok(BreachStats {
        breached,
        not_breached: starts.len() - breached,
        avg_breach_fraction,
    })
}
