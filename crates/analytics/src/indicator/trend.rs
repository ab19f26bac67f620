use meridian_core::market::entity::{Candle, IndicatorPoint};

/// # Summary
/// 计算每根 K 线的真实波幅 `max(H−L, |H−C₋₁|, |L−C₋₁|)`。
///
/// # Returns
/// 与输入等长的列表，下标 0 没有前收盘价，恒为 None。
pub fn true_range(candles: &[Candle]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(candles.len());
    if candles.is_empty() {
        return out;
    }
    out.push(None);
    for pair in candles.windows(2) {
        out.push(Some(tr_between(&pair[0], &pair[1])));
    }
    out
}

fn tr_between(prev: &Candle, cur: &Candle) -> f64 {
    let hl = cur.high - cur.low;
    let hc = (cur.high - prev.close).abs();
    let lc = (cur.low - prev.close).abs();
    hl.max(hc).max(lc)
}

/// # Summary
/// Wilder 滚动和：前 `period` 个输入求和作为种子，之后按 `S − S/period + x` 递推。
///
/// # Invariants
/// - 种子产生之前 `push` 始终返回 None。
/// - 种子产生之后每次 `push` 都返回新的滚动和，不会重新播种。
#[derive(Debug, Clone)]
pub struct WilderSum {
    period: usize,
    seed_sum: f64,
    seen: usize,
    sum: Option<f64>,
}

impl WilderSum {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            seed_sum: 0.0,
            seen: 0,
            sum: None,
        }
    }

    pub fn push(&mut self, x: f64) -> Option<f64> {
        let period = crate::num::count_f64(self.period);
        match self.sum {
            Some(s) => {
                let next = s - s / period + x;
                self.sum = Some(next);
            }
            None => {
                self.seed_sum += x;
                self.seen += 1;
                if self.period > 0 && self.seen == self.period {
                    self.sum = Some(self.seed_sum);
                }
            }
        }
        self.sum
    }

    /// 当前滚动和除以周期，即 Wilder 平均值
    pub fn average(&self) -> Option<f64> {
        self.sum.map(|s| s / crate::num::count_f64(self.period))
    }
}

/// # Summary
/// ATR 最新值。
///
/// # Logic
/// 1. 以 TR₁..TR_period 的均值作为种子。
/// 2. 之后按 Wilder 递推 `ATR = ATR₋₁ − ATR₋₁/period + TR/period`。
///
/// # Returns
/// 少于 `period + 1` 根 K 线或 `period` 为 0 时返回 None。
pub fn wilder_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }
    let mut sum = WilderSum::new(period);
    for pair in candles.windows(2) {
        sum.push(tr_between(&pair[0], &pair[1]));
    }
    sum.average()
}

/// # Summary
/// ADX 平滑所处的阶段。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdxPhase {
    // 收集前 period 个 DX，结束时取算术平均作为首个 ADX
    Seeding { dx_sum: f64, count: usize },
    // 已有首个 ADX，按 (ADX₋₁·(period−1) + DX)/period 递推
    Smoothing { adx: f64 },
}

/// # Summary
/// ADX 两阶段状态机：先做不加权平均，再做 Wilder 平滑。
///
/// # Invariants
/// - 从 `Seeding` 到 `Smoothing` 的转换只发生一次，恰在第 `period` 个 DX 输入时。
/// - 与从第一个 DX 开始直接平滑不等价。
#[derive(Debug, Clone)]
pub struct AdxSmoother {
    period: usize,
    phase: AdxPhase,
}

impl AdxSmoother {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            phase: AdxPhase::Seeding {
                dx_sum: 0.0,
                count: 0,
            },
        }
    }

    pub fn phase(&self) -> AdxPhase {
        self.phase
    }

    /// # Summary
    /// 输入一个 DX 值，返回当前 ADX（仍在播种阶段时为 None）。
    pub fn push(&mut self, dx: f64) -> Option<f64> {
        let period = crate::num::count_f64(self.period);
        match self.phase {
            AdxPhase::Seeding { dx_sum, count } => {
                let dx_sum = dx_sum + dx;
                let count = count + 1;
                if self.period > 0 && count == self.period {
                    let adx = dx_sum / period;
                    self.phase = AdxPhase::Smoothing { adx };
                    Some(adx)
                } else {
                    self.phase = AdxPhase::Seeding { dx_sum, count };
                    None
                }
            }
            AdxPhase::Smoothing { adx } => {
                let adx = (adx * (period - 1.0) + dx) / period;
                self.phase = AdxPhase::Smoothing { adx };
                Some(adx)
            }
        }
    }
}

/// # Summary
/// 计算逐根的 TR、ATR、+DI、−DI、DX、ADX。
///
/// # Logic
/// 1. `+DM = H − H₋₁`，仅当其为正且大于 `−DM = L₋₁ − L` 时保留，否则为 0；`−DM` 对称。
/// 2. TR、+DM、−DM 使用同一 Wilder 滚动和递推，下标 `period` 处产生首个 ATR/DI/DX。
/// 3. `DI± = 100 · ΣDM± / ΣTR`，`DX = 100 · |DI+ − DI−| / (DI+ + DI−)`，两个 DI 皆为 0 时 DX 为 0。
/// 4. DX 交给 `AdxSmoother`，首个 ADX 落在下标 `2·period − 1`。
///
/// # Arguments
/// * `candles`: 已归一化的 K 线。
/// * `period`: 平滑周期。
///
/// # Returns
/// 与输入等长的指标点列表。
pub fn directional_movement(candles: &[Candle], period: usize) -> Vec<IndicatorPoint> {
    let mut points: Vec<IndicatorPoint> = candles
        .iter()
        .map(|c| IndicatorPoint {
            timestamp: c.timestamp,
            ..IndicatorPoint::default()
        })
        .collect();
    if period == 0 {
        return points;
    }

    let mut tr_sum = WilderSum::new(period);
    let mut plus_sum = WilderSum::new(period);
    let mut minus_sum = WilderSum::new(period);
    let mut smoother = AdxSmoother::new(period);

    for (i, pair) in candles.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let tr = tr_between(prev, cur);
        let up = cur.high - prev.high;
        let down = prev.low - cur.low;
        let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
        let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };

        let point = &mut points[i + 1];
        point.tr = Some(tr);

        let sums = (
            tr_sum.push(tr),
            plus_sum.push(plus_dm),
            minus_sum.push(minus_dm),
        );
        let (Some(s_tr), Some(s_plus), Some(s_minus)) = sums else {
            continue;
        };

        let (di_plus, di_minus) = if s_tr > 0.0 {
            (100.0 * s_plus / s_tr, 100.0 * s_minus / s_tr)
        } else {
            (0.0, 0.0)
        };
        let di_total = di_plus + di_minus;
        let dx = if di_total > 0.0 {
            100.0 * (di_plus - di_minus).abs() / di_total
        } else {
            0.0
        };

        point.atr = tr_sum.average();
        point.di_plus = Some(di_plus);
        point.di_minus = Some(di_minus);
        point.dx = Some(dx);
        point.adx = smoother.push(dx);
    }

    points
}
