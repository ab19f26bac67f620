use crate::num::count_f64;
use meridian_core::market::entity::Candle;

/// # Summary
/// 收盘价对数收益的年化波动率。
///
/// # Logic
/// 1. 最新一根 K 线视为仍在形成中，不参与计算。
/// 2. 取其之前的 `window + 1` 个收盘价，计算 `window` 个对数收益；非正价格对应的收益跳过。
/// 3. 样本标准差 (n−1 分母)，至少需要 2 个收益。
/// 4. 乘以 `sqrt(periods_per_year)` 年化。
///
/// # Arguments
/// * `candles`: 已归一化的 K 线。
/// * `window`: 收益个数。
/// * `periods_per_year`: 每年 K 线根数。
///
/// # Returns
/// 历史不足时返回 None；收盘价全部相同时返回 0。
pub fn realized_volatility(candles: &[Candle], window: usize, periods_per_year: f64) -> Option<f64> {
    if window == 0 || !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return None;
    }
    let completed = candles.len().checked_sub(1)?;
    if completed < window + 1 {
        return None;
    }
    let closes: Vec<f64> = candles[completed - (window + 1)..completed]
        .iter()
        .map(|c| c.close)
        .collect();

    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let n = count_f64(returns.len());
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt() * periods_per_year.sqrt())
}

/// # Summary
/// Parkinson 高低价波动率。
///
/// # Logic
/// 1. 取最近 `window` 根 K 线，跳过高低价非正的 K 线。
/// 2. `Var = mean(ln(H/L)²) / (4·ln2)`。
/// 3. 先乘 `periods_per_year` 再开方得到年化值。
///
/// # Returns
/// 可用 K 线少于 2 根时返回 None，否则结果恒不小于 0。
pub fn parkinson_volatility(candles: &[Candle], window: usize, periods_per_year: f64) -> Option<f64> {
    if window == 0 || !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return None;
    }
    let start = candles.len().saturating_sub(window);
    let squared: Vec<f64> = candles[start..]
        .iter()
        .filter(|c| c.high > 0.0 && c.low > 0.0)
        .map(|c| (c.high / c.low).ln().powi(2))
        .collect();
    if squared.len() < 2 {
        return None;
    }

    let mean = squared.iter().sum::<f64>() / count_f64(squared.len());
    let variance = mean / (4.0 * std::f64::consts::LN_2);
    Some((variance * periods_per_year).sqrt())
}
