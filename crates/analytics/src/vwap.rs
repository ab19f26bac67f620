use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use meridian_core::market::entity::Candle;
use serde::{Deserialize, Serialize};

use crate::num::count_f64;

/// # Summary
/// VWAP 权重策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VwapWeighting {
    // 仅成交量加权；区间内无可用成交量时结果未定义
    Volume,
    // 优先成交量加权，无可用成交量时退化为等权
    VolumeOrEqual,
    // 忽略成交量，每根 K 线权重为 1
    Equal,
}

/// 实际采用的加权方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VwapBasis {
    Volume,
    Equal,
}

/// # Summary
/// VWAP 计算结果。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VwapValue {
    pub value: f64,
    pub basis: VwapBasis,
    // 实际参与计算的 K 线数量
    pub bars: usize,
}

/// # Summary
/// 计算闭区间 `[start, end]` 内的 VWAP。
///
/// # Logic
/// 1. `end` 超出序列时截断到最后一根，`start > end` 时未定义。
/// 2. 成交量加权只累计成交量为正的 K 线。
/// 3. 无可用成交量时按 `weighting` 决定返回 None 或退化为等权平均。
///
/// # Arguments
/// * `candles`: 已归一化的 K 线。
/// * `start`: 起始下标 (包含)。
/// * `end`: 结束下标 (包含)。
/// * `weighting`: 权重策略。
///
/// # Returns
/// 区间内没有有效典型价格时返回 None。
pub fn vwap(candles: &[Candle], start: usize, end: usize, weighting: VwapWeighting) -> Option<VwapValue> {
    let last = candles.len().checked_sub(1)?;
    let end = end.min(last);
    if start > end {
        return None;
    }
    let range = &candles[start..=end];

    if weighting != VwapWeighting::Equal {
        let mut pv = 0.0;
        let mut vol = 0.0;
        let mut bars = 0;
        for c in range {
            let tp = c.typical_price();
            match c.volume {
                Some(v) if v > 0.0 && tp.is_finite() => {
                    pv += tp * v;
                    vol += v;
                    bars += 1;
                }
                _ => {}
            }
        }
        if vol > 0.0 {
            return Some(VwapValue {
                value: pv / vol,
                basis: VwapBasis::Volume,
                bars,
            });
        }
        if weighting == VwapWeighting::Volume {
            return None;
        }
    }

    equal_weight_average(candles, start, end).map(|(value, bars)| VwapValue {
        value,
        basis: VwapBasis::Equal,
        bars,
    })
}

/// # Summary
/// 闭区间内典型价格的等权平均。
///
/// # Returns
/// `(平均值, 参与的 K 线数)`；无有效 K 线时返回 None。
pub fn equal_weight_average(candles: &[Candle], start: usize, end: usize) -> Option<(f64, usize)> {
    let last = candles.len().checked_sub(1)?;
    let end = end.min(last);
    if start > end {
        return None;
    }
    let prices: Vec<f64> = candles[start..=end]
        .iter()
        .map(Candle::typical_price)
        .filter(|tp| tp.is_finite())
        .collect();
    if prices.is_empty() {
        return None;
    }
    Some((prices.iter().sum::<f64>() / count_f64(prices.len()), prices.len()))
}

/// # Summary
/// 从锚点下标到最后一根 K 线的 VWAP。
pub fn anchored_vwap(candles: &[Candle], anchor_index: usize, weighting: VwapWeighting) -> Option<VwapValue> {
    vwap(candles, anchor_index, candles.len().saturating_sub(1), weighting)
}

/// # Summary
/// 当日会话 VWAP。
///
/// # Logic
/// 1. 在参考时区内求出 `now` 所在的自然日。
/// 2. 找到第一根同一自然日的 K 线。
/// 3. 计算该下标到序列末尾的 VWAP。
///
/// # Arguments
/// * `candles`: 已归一化的 K 线。
/// * `now`: 当前时刻。
/// * `tz`: 参考时区，保证结果与客户端所在地无关。
/// * `weighting`: 权重策略。
///
/// # Returns
/// 当日没有 K 线时返回 None。
pub fn session_vwap(
    candles: &[Candle],
    now: DateTime<Utc>,
    tz: Tz,
    weighting: VwapWeighting,
) -> Option<VwapValue> {
    let today = now.with_timezone(&tz).date_naive();
    let start = candles.iter().position(|c| {
        c.time()
            .map(|t| t.with_timezone(&tz).date_naive() == today)
            .unwrap_or(false)
    })?;
    anchored_vwap(candles, start, weighting)
}

/// # Summary
/// 相对距离 `(spot − reference) / reference`。
///
/// # Returns
/// `reference` 为 0 或任一操作数非有限时返回 None。
pub fn percent_distance(spot: f64, reference: f64) -> Option<f64> {
    if !spot.is_finite() || !reference.is_finite() || reference == 0.0 {
        return None;
    }
    Some((spot - reference) / reference)
}
