use meridian_analytics::indicator::{
    AdxPhase, AdxSmoother, directional_movement, parkinson_volatility, realized_volatility,
    true_range, wilder_atr,
};
use meridian_core::common::Resolution;
use meridian_core::market::entity::Candle;

const DAY_MS: i64 = 86_400_000;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn bar(i: i64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp: i * DAY_MS,
        open: close,
        high,
        low,
        close,
        volume: None,
    }
}

#[test]
fn test_true_range_first_index_undefined() {
    let candles = vec![bar(0, 101.0, 99.0, 100.0), bar(1, 104.0, 102.0, 103.0)];
    let tr = true_range(&candles);
    assert_eq!(tr.len(), 2);
    assert!(tr[0].is_none());
    // 向上跳空：|H − C₋₁| = 4 大于 H − L = 2
    assert!(approx(tr[1].unwrap(), 4.0));
}

#[test]
fn test_atr_requires_period_plus_one() {
    let candles: Vec<Candle> = (0..3).map(|i| bar(i, 101.0, 99.0, 100.0)).collect();
    assert!(wilder_atr(&candles, 3).is_none());
    assert!(wilder_atr(&candles, 0).is_none());

    let mut candles = candles;
    candles.push(bar(3, 101.0, 99.0, 100.0));
    let first = wilder_atr(&candles, 3).unwrap();
    assert!(approx(first, 2.0));
    // 同一输入重复计算结果一致
    assert_eq!(wilder_atr(&candles, 3), Some(first));
}

#[test]
fn test_atr_wilder_recursion() {
    let mut candles: Vec<Candle> = (0..4).map(|i| bar(i, 101.0, 99.0, 100.0)).collect();
    candles.push(bar(4, 104.0, 96.0, 100.0));
    // 种子 ATR = 2，之后 2 − 2/3 + 8/3 = 4
    assert!(approx(wilder_atr(&candles, 3).unwrap(), 4.0));

    let points = directional_movement(&candles, 3);
    assert!(points[2].atr.is_none());
    assert!(approx(points[3].atr.unwrap(), 2.0));
    assert!(approx(points[4].atr.unwrap(), 4.0));
}

#[test]
fn test_adx_uptrend_and_seeding_index() {
    let period = 14;
    let candles: Vec<Candle> = (0..40)
        .map(|i| {
            let close = 100.0 + i as f64;
            bar(i, close + 0.5, close - 0.5, close)
        })
        .collect();
    let points = directional_movement(&candles, period);
    assert_eq!(points.len(), candles.len());

    // ATR/DI 在下标 period 处首次出现
    assert!(points[period - 1].di_plus.is_none());
    assert!(points[period].di_plus.is_some());

    for p in points.iter().filter(|p| p.di_plus.is_some()) {
        assert!(p.di_plus.unwrap() > p.di_minus.unwrap());
    }

    // 首个 ADX 落在 2·period − 1
    assert!(points[2 * period - 2].adx.is_none());
    let first_adx = points[2 * period - 1].adx.unwrap();
    assert!(approx(first_adx, 100.0));
    assert!(approx(points.last().unwrap().adx.unwrap(), 100.0));
}

#[test]
fn test_adx_flat_series_has_zero_dx() {
    let candles: Vec<Candle> = (0..10).map(|i| bar(i, 100.0, 100.0, 100.0)).collect();
    let points = directional_movement(&candles, 3);
    let last = points.last().unwrap();
    assert_eq!(last.di_plus, Some(0.0));
    assert_eq!(last.di_minus, Some(0.0));
    assert_eq!(last.dx, Some(0.0));
    assert_eq!(last.adx, Some(0.0));
}

#[test]
fn test_adx_smoother_phase_transition() {
    let mut smoother = AdxSmoother::new(3);
    assert_eq!(smoother.push(10.0), None);
    assert_eq!(smoother.push(20.0), None);
    assert_eq!(
        smoother.phase(),
        AdxPhase::Seeding {
            dx_sum: 30.0,
            count: 2
        }
    );

    // 第 period 个 DX：不加权平均
    assert_eq!(smoother.push(30.0), Some(20.0));
    assert_eq!(smoother.phase(), AdxPhase::Smoothing { adx: 20.0 });

    // 之后进入 Wilder 平滑
    let next = smoother.push(40.0).unwrap();
    assert!(approx(next, (20.0 * 2.0 + 40.0) / 3.0));
}

#[test]
fn test_realized_vol_end_to_end_window() {
    let closes = [100.0, 102.0, 101.0, 105.0, 103.0];
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, c)| Candle::flat(i as i64 * DAY_MS, *c))
        .collect();
    let ppy = Resolution::Day1.periods_per_year(365.0);

    assert!(realized_volatility(&candles, 4, ppy).is_none());
    let vol = realized_volatility(&candles, 3, ppy).unwrap();
    assert!(vol.is_finite() && vol > 0.0);

    // 手工复算：前 4 个收盘价的 3 个对数收益
    let r: Vec<f64> = closes[..4].windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let mean = r.iter().sum::<f64>() / 3.0;
    let var = r.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 2.0;
    assert!(approx(vol, var.sqrt() * 365f64.sqrt()));
}

#[test]
fn test_realized_vol_zero_for_constant_closes() {
    let candles: Vec<Candle> = (0..10).map(|i| Candle::flat(i * DAY_MS, 50.0)).collect();
    assert_eq!(realized_volatility(&candles, 5, 365.0), Some(0.0));
}

#[test]
fn test_parkinson_volatility() {
    let candles = vec![bar(0, 110.0, 100.0, 105.0), bar(1, 110.0, 100.0, 105.0)];
    let vol = parkinson_volatility(&candles, 20, 365.0).unwrap();
    let expected = ((1.1f64).ln().powi(2) / (4.0 * 2f64.ln()) * 365.0).sqrt();
    assert!(approx(vol, expected));

    let flat: Vec<Candle> = (0..5).map(|i| Candle::flat(i * DAY_MS, 10.0)).collect();
    assert_eq!(parkinson_volatility(&flat, 5, 365.0), Some(0.0));
}

#[test]
fn test_parkinson_requires_two_usable_bars() {
    let candles = vec![
        bar(0, 110.0, 0.0, 105.0),
        bar(1, 110.0, -1.0, 105.0),
        bar(2, 110.0, 100.0, 105.0),
    ];
    assert!(parkinson_volatility(&candles, 3, 365.0).is_none());
    // 窗口只覆盖最近一根
    let good = vec![bar(0, 110.0, 100.0, 105.0), bar(1, 110.0, 100.0, 105.0)];
    assert!(parkinson_volatility(&good, 1, 365.0).is_none());
}
