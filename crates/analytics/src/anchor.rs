use chrono::{DateTime, Datelike, Duration, Utc};
use chrono_tz::Tz;
use meridian_core::market::entity::{Anchor, AnchorKind, Candle};

/// 事件 K 线默认回看天数
pub const DEFAULT_EVENT_LOOKBACK_DAYS: i64 = 14;

/// # Summary
/// 寻找最近的摆动高/低点。
///
/// # Logic
/// 1. 从 `len − 1 − right` 向前扫描到 `start + left`，`start` 由 `lookback` 决定。
/// 2. 下标 `i` 的最高价严格大于 `[i−left, i+right]` 内其他所有 K 线的最高价时为高点；低点对称。
/// 3. 同一下标同时满足时先判定高点。
///
/// # Arguments
/// * `candles`: 已归一化的 K 线。
/// * `left`: 左侧确认根数。
/// * `right`: 右侧确认根数。
/// * `lookback`: 仅在最近若干根内寻找，None 表示全序列。
///
/// # Returns
/// 返回扫描中遇到的第一个 (最近的) 摆动点。
pub fn swing_pivot(candles: &[Candle], left: usize, right: usize, lookback: Option<usize>) -> Option<Anchor> {
    let len = candles.len();
    let start = lookback.map(|n| len.saturating_sub(n)).unwrap_or(0);
    let first = len.checked_sub(1 + right)?;
    let last = start + left;
    if first < last {
        return None;
    }

    for i in (last..=first).rev() {
        let pivot = &candles[i];
        let neighbours = &candles[i - left..=i + right];
        let is_other = |j: usize| j != left;

        let high = neighbours
            .iter()
            .enumerate()
            .all(|(j, c)| !is_other(j) || pivot.high > c.high);
        if high {
            return Some(Anchor {
                index: i,
                timestamp: pivot.timestamp,
                kind: AnchorKind::High,
            });
        }
        let low = neighbours
            .iter()
            .enumerate()
            .all(|(j, c)| !is_other(j) || pivot.low < c.low);
        if low {
            return Some(Anchor {
                index: i,
                timestamp: pivot.timestamp,
                kind: AnchorKind::Low,
            });
        }
    }
    None
}

/// # Summary
/// 当月第一根 K 线。
///
/// # Logic
/// 在参考时区内比较年份与月份，返回第一根与 `now` 同月的 K 线。
pub fn month_open_anchor(candles: &[Candle], now: DateTime<Utc>, tz: Tz) -> Option<Anchor> {
    let local_now = now.with_timezone(&tz);
    let month = (local_now.year(), local_now.month());
    candles
        .iter()
        .enumerate()
        .find(|(_, c)| {
            c.time()
                .map(|t| {
                    let local = t.with_timezone(&tz);
                    (local.year(), local.month()) == month
                })
                .unwrap_or(false)
        })
        .map(|(index, c)| Anchor {
            index,
            timestamp: c.timestamp,
            kind: AnchorKind::MonthOpen,
        })
}

/// # Summary
/// 回看窗口内 `区间 × 成交量` 最大的事件 K 线。
///
/// # Logic
/// 1. 窗口以最后一根 K 线的时间为终点，向前 `lookback_days` 天。
/// 2. 成交量缺失时按 1 计，评分退化为纯区间。
/// 3. 严格大于才替换，平局保留最早找到的 K 线。
/// 4. 回看天数超出 `Duration` 可表示范围时，全部 K 线都参与。
pub fn event_anchor(candles: &[Candle], lookback_days: i64) -> Option<Anchor> {
    let last = candles.last()?;
    // 无法表示的窗口视为不设下限
    let cutoff = Duration::try_days(lookback_days)
        .map(|d| last.timestamp.saturating_sub(d.num_milliseconds()))
        .unwrap_or(i64::MIN);

    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candles.iter().enumerate() {
        if c.timestamp < cutoff {
            continue;
        }
        let score = c.range() * c.volume.unwrap_or(1.0);
        if !score.is_finite() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }

    best.map(|(index, _)| Anchor {
        index,
        timestamp: candles[index].timestamp,
        kind: AnchorKind::Event,
    })
}
