use meridian_core::options::entity::{BucketKind, LevelRow, StrikeBucket, StrikeMapState, StrikeRecord};
use std::cmp::Ordering;

/// 综合评分中 Gamma 的权重
pub const GAMMA_WEIGHT: f64 = 0.6;
/// 综合评分中 OI 的权重
pub const OI_WEIGHT: f64 = 0.4;
/// 低于该评分的行权价不做分类
pub const CLASSIFY_THRESHOLD: f64 = 0.15;
/// 距现价在 `window × 0.25` 以内视为磁吸位
pub const MAGNET_BAND_RATIO: f64 = 0.25;
/// 排行表每侧最多行数
pub const TABLE_ROWS: usize = 3;

/// 按行权价汇总后的原始量
#[derive(Debug, Clone, Copy)]
struct StrikeTotals {
    strike: f64,
    gamma: f64,
    oi: f64,
}

/// # Summary
/// 合并 Gamma 与 OI 数据并输出行权价分类结果。
///
/// # Logic
/// 1. 两组数据各自过滤到 `spot·(1±window)` 内；现价缺失时不过滤。
/// 2. 按行权价分别累加 Gamma 与 OI 的绝对值。
/// 3. 各指标除以过滤后集合内的最大值归一化，指标完全缺失时为 0。
/// 4. 评分 `0.6·gamma + 0.4·oi`。
/// 5. 评分低于 0.15 为 `none`；否则距现价在 `0.25×window` 内为 `magnet`，低于现价为 `support`，高于为 `resistance`。
/// 6. 主支撑/主阻力取同类评分最高者，平局保留先遇到的 (行权价升序)。
/// 7. Pin 在磁吸位中选评分最高者，无磁吸位时在支撑与阻力中选；平局取离现价更近者。
/// 8. 每侧按评分取前 3 名生成排行表。
///
/// # Arguments
/// * `gamma`: Gamma 敞口记录。
/// * `oi`: 未平仓量记录。
/// * `spot`: 现价，缺失时只计算评分，分类退化为 `magnet`/`none`。
/// * `window`: 过滤窗口比例 (0.05 即 ±5%)。
///
/// # Returns
/// 没有任何数据点时返回空结果，所有字段为 None。
pub fn build_strike_map(
    gamma: &[StrikeRecord],
    oi: &[StrikeRecord],
    spot: Option<f64>,
    window: f64,
) -> StrikeMapState {
    let spot = spot.filter(|s| s.is_finite() && *s > 0.0);
    let window = if window.is_finite() && window > 0.0 { window } else { 0.0 };

    let totals = aggregate(gamma, oi, spot, window);
    if totals.is_empty() {
        return StrikeMapState::default();
    }

    let max_gamma = totals.iter().map(|t| t.gamma).fold(0.0, f64::max);
    let max_oi = totals.iter().map(|t| t.oi).fold(0.0, f64::max);
    let norm = |v: f64, max: f64| if max > 0.0 { v / max } else { 0.0 };

    let buckets: Vec<StrikeBucket> = totals
        .iter()
        .map(|t| {
            let gamma_score = norm(t.gamma, max_gamma);
            let oi_score = norm(t.oi, max_oi);
            let score = GAMMA_WEIGHT * gamma_score + OI_WEIGHT * oi_score;
            StrikeBucket {
                strike: t.strike,
                score,
                kind: classify(t.strike, score, spot, window),
                gamma_score,
                oi_score,
            }
        })
        .collect();

    let main_support = highest(of_kind(&buckets, BucketKind::Support)).map(|b| b.strike);
    let main_resistance = highest(of_kind(&buckets, BucketKind::Resistance)).map(|b| b.strike);

    let magnets: Vec<&StrikeBucket> = of_kind(&buckets, BucketKind::Magnet).collect();
    let pin_candidates: Vec<&StrikeBucket> = if magnets.is_empty() {
        buckets
            .iter()
            .filter(|b| matches!(b.kind, BucketKind::Support | BucketKind::Resistance))
            .collect()
    } else {
        magnets
    };
    let pin_strike = pick_pin(&pin_candidates, spot).map(|b| b.strike);
    let pin_distance_pct = pin_strike.and_then(|p| distance_pct(p, spot));

    let support_rows = table_rows(
        of_kind(&buckets, BucketKind::Support),
        spot,
        "Main support",
        "Support",
    );
    let resistance_rows = table_rows(
        of_kind(&buckets, BucketKind::Resistance),
        spot,
        "Main resistance",
        "Resistance",
    );

    StrikeMapState {
        pin_strike,
        pin_distance_pct,
        main_support,
        main_resistance,
        buckets,
        support_rows,
        resistance_rows,
    }
}

fn aggregate(gamma: &[StrikeRecord], oi: &[StrikeRecord], spot: Option<f64>, window: f64) -> Vec<StrikeTotals> {
    let in_window = |strike: f64| match spot {
        Some(s) => strike >= s * (1.0 - window) && strike <= s * (1.0 + window),
        None => true,
    };
    let valid = |r: &&StrikeRecord| r.strike.is_finite() && r.value.is_finite() && in_window(r.strike);

    let mut entries: Vec<StrikeTotals> = gamma
        .iter()
        .filter(valid)
        .map(|r| StrikeTotals {
            strike: r.strike,
            gamma: r.value.abs(),
            oi: 0.0,
        })
        .chain(oi.iter().filter(valid).map(|r| StrikeTotals {
            strike: r.strike,
            gamma: 0.0,
            oi: r.value.abs(),
        }))
        .collect();
    entries.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    let mut totals: Vec<StrikeTotals> = Vec::with_capacity(entries.len());
    for e in entries {
        match totals.last_mut() {
            Some(last) if last.strike == e.strike => {
                last.gamma += e.gamma;
                last.oi += e.oi;
            }
            _ => totals.push(e),
        }
    }
    totals
}

fn classify(strike: f64, score: f64, spot: Option<f64>, window: f64) -> BucketKind {
    if score < CLASSIFY_THRESHOLD {
        return BucketKind::None;
    }
    let Some(spot) = spot else {
        // 没有现价无法区分方向，达到阈值的行权价统一视为磁吸位
        return BucketKind::Magnet;
    };
    let distance = ((strike - spot) / spot).abs();
    if distance <= MAGNET_BAND_RATIO * window {
        BucketKind::Magnet
    } else if strike < spot {
        BucketKind::Support
    } else {
        BucketKind::Resistance
    }
}

fn of_kind(buckets: &[StrikeBucket], kind: BucketKind) -> impl Iterator<Item = &StrikeBucket> {
    buckets.iter().filter(move |b| b.kind == kind)
}

fn highest<'a>(buckets: impl Iterator<Item = &'a StrikeBucket>) -> Option<&'a StrikeBucket> {
    let mut best: Option<&StrikeBucket> = None;
    for b in buckets {
        match best {
            Some(current) if b.score <= current.score => {}
            _ => best = Some(b),
        }
    }
    best
}

fn pick_pin<'a>(candidates: &[&'a StrikeBucket], spot: Option<f64>) -> Option<&'a StrikeBucket> {
    let proximity = |b: &StrikeBucket| spot.map(|s| (b.strike - s).abs()).unwrap_or(0.0);
    let mut best: Option<&StrikeBucket> = None;
    for &b in candidates {
        let better = match best {
            None => true,
            Some(current) => match b.score.total_cmp(&current.score) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => proximity(b) < proximity(current),
            },
        };
        if better {
            best = Some(b);
        }
    }
    best
}

fn distance_pct(strike: f64, spot: Option<f64>) -> Option<f64> {
    spot.map(|s| (strike - s) / s * 100.0)
}

fn table_rows<'a>(
    buckets: impl Iterator<Item = &'a StrikeBucket>,
    spot: Option<f64>,
    main_label: &str,
    side_label: &str,
) -> Vec<LevelRow> {
    let mut ranked: Vec<&StrikeBucket> = buckets.collect();
    // 稳定排序，同分保留行权价升序
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
        .into_iter()
        .take(TABLE_ROWS)
        .enumerate()
        .map(|(i, b)| LevelRow {
            label: if i == 0 {
                main_label.to_string()
            } else {
                format!("{} #{}", side_label, i + 1)
            },
            strike: b.strike,
            score: b.score,
            distance_pct: distance_pct(b.strike, spot),
        })
        .collect()
}
