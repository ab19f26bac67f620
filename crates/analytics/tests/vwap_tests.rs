use chrono::{TimeZone, Utc};
use chrono_tz::America::New_York;
use meridian_analytics::anchor::{event_anchor, month_open_anchor, swing_pivot};
use meridian_analytics::vwap::{
    VwapBasis, VwapWeighting, anchored_vwap, percent_distance, session_vwap, vwap,
};
use meridian_core::market::entity::{AnchorKind, Candle};

const DAY_MS: i64 = 86_400_000;

fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().timestamp_millis()
}

fn candle(timestamp: i64, high: f64, low: f64, close: f64, volume: Option<f64>) -> Candle {
    Candle {
        timestamp,
        open: close,
        high,
        low,
        close,
        volume,
    }
}

#[test]
fn test_single_bar_vwap_is_typical_price() {
    let c = candle(0, 12.0, 9.0, 10.5, Some(1000.0));
    let out = vwap(&[c], 0, 0, VwapWeighting::Volume).unwrap();
    assert_eq!(out.basis, VwapBasis::Volume);
    assert_eq!(out.bars, 1);
    assert!((out.value - c.typical_price()).abs() < 1e-12);
}

#[test]
fn test_vwap_ignores_bars_without_volume() {
    let candles = vec![
        candle(0, 10.0, 10.0, 10.0, Some(1.0)),
        candle(1, 50.0, 50.0, 50.0, None),
        candle(2, 20.0, 20.0, 20.0, Some(3.0)),
        candle(3, 90.0, 90.0, 90.0, Some(0.0)),
    ];
    let out = vwap(&candles, 0, 99, VwapWeighting::Volume).unwrap();
    assert_eq!(out.bars, 2);
    assert!((out.value - 17.5).abs() < 1e-12);
}

#[test]
fn test_vwap_equal_weight_fallback() {
    let candles = vec![
        candle(0, 10.0, 10.0, 10.0, None),
        candle(1, 20.0, 20.0, 20.0, None),
    ];
    assert!(vwap(&candles, 0, 1, VwapWeighting::Volume).is_none());

    let fallback = vwap(&candles, 0, 1, VwapWeighting::VolumeOrEqual).unwrap();
    assert_eq!(fallback.basis, VwapBasis::Equal);
    assert!((fallback.value - 15.0).abs() < 1e-12);

    assert!(vwap(&candles, 2, 1, VwapWeighting::Equal).is_none());
    assert!(vwap(&[], 0, 0, VwapWeighting::Equal).is_none());
}

#[test]
fn test_anchored_vwap_runs_to_last_bar() {
    let candles = vec![
        candle(0, 100.0, 100.0, 100.0, Some(5.0)),
        candle(1, 10.0, 10.0, 10.0, Some(1.0)),
        candle(2, 20.0, 20.0, 20.0, Some(1.0)),
    ];
    let out = anchored_vwap(&candles, 1, VwapWeighting::Volume).unwrap();
    assert!((out.value - 15.0).abs() < 1e-12);
}

#[test]
fn test_session_vwap_uses_reference_timezone() {
    let candles = vec![
        candle(ts(2024, 3, 14, 19, 0), 10.0, 10.0, 10.0, Some(1.0)),
        // UTC 已是 15 日，但纽约仍为 14 日 22:00
        candle(ts(2024, 3, 15, 2, 0), 30.0, 30.0, 30.0, Some(1.0)),
        candle(ts(2024, 3, 15, 14, 0), 100.0, 100.0, 100.0, Some(1.0)),
        candle(ts(2024, 3, 15, 15, 0), 200.0, 200.0, 200.0, Some(3.0)),
    ];
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap();
    let out = session_vwap(&candles, now, New_York, VwapWeighting::Volume).unwrap();
    assert_eq!(out.bars, 2);
    assert!((out.value - 175.0).abs() < 1e-12);

    let later = Utc.with_ymd_and_hms(2024, 3, 17, 18, 0, 0).unwrap();
    assert!(session_vwap(&candles, later, New_York, VwapWeighting::Volume).is_none());
}

#[test]
fn test_percent_distance() {
    assert_eq!(percent_distance(110.0, 100.0), Some(0.1));
    assert_eq!(percent_distance(110.0, 0.0), None);
    assert_eq!(percent_distance(f64::NAN, 100.0), None);
}

fn pivot_series(highs: &[f64]) -> Vec<Candle> {
    highs
        .iter()
        .enumerate()
        .map(|(i, h)| candle(i as i64 * DAY_MS, *h, h - 0.5, h - 0.25, Some(1.0)))
        .collect()
}

#[test]
fn test_swing_pivot_returns_most_recent() {
    let candles = pivot_series(&[1.0, 2.0, 3.0, 10.0, 3.0, 2.0, 1.0, 2.0, 3.0]);
    let anchor = swing_pivot(&candles, 2, 2, None).unwrap();
    assert_eq!(anchor.index, 6);
    assert_eq!(anchor.kind, AnchorKind::Low);
}

#[test]
fn test_swing_pivot_high() {
    let candles = pivot_series(&[1.0, 2.0, 3.0, 10.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let anchor = swing_pivot(&candles, 2, 2, None).unwrap();
    assert_eq!(anchor.index, 3);
    assert_eq!(anchor.kind, AnchorKind::High);
    assert_eq!(anchor.timestamp, 3 * DAY_MS);

    // 回看窗口不含下标 3 时找不到
    assert!(swing_pivot(&candles, 2, 2, Some(5)).is_none());
}

#[test]
fn test_swing_pivot_requires_strict_extreme() {
    let candles = pivot_series(&[1.0, 2.0, 5.0, 5.0, 2.0, 3.0, 4.0]);
    assert!(swing_pivot(&candles, 2, 2, None).is_none());
    assert!(swing_pivot(&candles[..3], 2, 2, None).is_none());
}

#[test]
fn test_month_open_anchor_in_reference_timezone() {
    let candles = vec![
        candle(ts(2024, 2, 28, 15, 0), 1.0, 1.0, 1.0, None),
        // UTC 3 月 1 日 03:00 在纽约仍是 2 月 29 日
        candle(ts(2024, 3, 1, 3, 0), 1.0, 1.0, 1.0, None),
        candle(ts(2024, 3, 1, 15, 0), 1.0, 1.0, 1.0, None),
        candle(ts(2024, 3, 14, 15, 0), 1.0, 1.0, 1.0, None),
    ];
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    let anchor = month_open_anchor(&candles, now, New_York).unwrap();
    assert_eq!(anchor.index, 2);
    assert_eq!(anchor.kind, AnchorKind::MonthOpen);

    let april = Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap();
    assert!(month_open_anchor(&candles, april, New_York).is_none());
}

#[test]
fn test_event_anchor_window_and_ties() {
    let candles = vec![
        // 窗口之外的巨量 K 线不参与
        candle(0, 200.0, 0.0, 100.0, Some(1e9)),
        candle(20 * DAY_MS, 102.0, 100.0, 101.0, Some(10.0)),
        candle(21 * DAY_MS, 105.0, 100.0, 101.0, Some(4.0)),
        candle(22 * DAY_MS, 104.0, 102.0, 103.0, Some(10.0)),
        candle(23 * DAY_MS, 101.0, 100.0, 100.5, None),
    ];
    let anchor = event_anchor(&candles, 14).unwrap();
    // 20、21、22 日评分都是 20，平局保留最早的一根
    assert_eq!(anchor.index, 1);
    assert_eq!(anchor.kind, AnchorKind::Event);
    assert!(event_anchor(&[], 14).is_none());
}

#[test]
fn test_event_anchor_unrepresentable_window_scans_all() {
    let candles = vec![
        candle(0, 200.0, 0.0, 100.0, Some(1e9)),
        candle(20 * DAY_MS, 102.0, 100.0, 101.0, Some(10.0)),
    ];
    // 回看天数超出 chrono 的范围时不设下限，最早的巨量 K 线也参与
    let anchor = event_anchor(&candles, 200_000_000_000).unwrap();
    assert_eq!(anchor.index, 0);
    let anchor = event_anchor(&candles, i64::MAX).unwrap();
    assert_eq!(anchor.index, 0);
}
