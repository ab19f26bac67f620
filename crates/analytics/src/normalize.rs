use crate::num::millis_from_f64;
use meridian_core::market::entity::{Candle, RawCandle};
use std::collections::BTreeMap;

/// # Summary
/// K 线归一化：排序、去重并校验原始记录，得到后续所有阶段唯一允许消费的形式。
///
/// # Logic
/// 1. 丢弃时间戳或收盘价缺失/非有限的记录。
/// 2. `open/high/low` 缺失或非有限时回填为收盘价。
/// 3. 成交量缺失、非有限或为负时视为缺失。
/// 4. 按时间戳升序排列，同一时间戳保留最后出现的记录。
///
/// # Arguments
/// * `raw`: 任意顺序的原始 K 线。
///
/// # Returns
/// 按时间升序、时间戳唯一的 K 线列表。该函数是幂等的。
pub fn normalize(raw: &[RawCandle]) -> Vec<Candle> {
    let mut by_time: BTreeMap<i64, Candle> = BTreeMap::new();
    for record in raw {
        if let Some(candle) = validate(record) {
            by_time.insert(candle.timestamp, candle);
        }
    }
    by_time.into_values().collect()
}

fn validate(record: &RawCandle) -> Option<Candle> {
    let timestamp = record.timestamp.and_then(millis_from_f64)?;
    let close = record.close.filter(|c| c.is_finite())?;
    let or_close = |v: Option<f64>| v.filter(|x| x.is_finite()).unwrap_or(close);

    Some(Candle {
        timestamp,
        open: or_close(record.open),
        high: or_close(record.high),
        low: or_close(record.low),
        close,
        volume: record.volume.filter(|v| v.is_finite() && *v >= 0.0),
    })
}
