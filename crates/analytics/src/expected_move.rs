use meridian_core::options::entity::{
    ExpectedMovePick, ExpectedMoveSnapshot, IvBasis, MoveBasis, MoveSource, Record,
};

use crate::probe;

/// 年化使用的自然日数
pub const DAYS_PER_YEAR: f64 = 365.0;

/// 大于该值的隐含波动率视为百分点 (18.5 → 0.185)
const IV_PERCENT_POINT_THRESHOLD: f64 = 2.0;

/// 现价高于该值时，含糊字段不大于 `AMBIGUOUS_PERCENT_CEILING` 即判定为百分比
const AMBIGUOUS_SPOT_FLOOR: f64 = 20.0;
const AMBIGUOUS_PERCENT_CEILING: f64 = 3.0;

fn horizon_factor(days: f64) -> Option<f64> {
    (days.is_finite() && days > 0.0).then(|| (days / DAYS_PER_YEAR).sqrt())
}

fn positive(x: f64) -> Option<f64> {
    (x.is_finite() && x > 0.0).then_some(x)
}

/// `spot · IV · sqrt(days/365)`
pub fn em_abs_from_spot_iv(spot: f64, iv: f64, days: f64) -> Option<f64> {
    let spot = positive(spot)?;
    if !iv.is_finite() || iv < 0.0 {
        return None;
    }
    Some(spot * iv * horizon_factor(days)?)
}

/// `IV · sqrt(days/365)`
pub fn em_pct_from_iv(iv: f64, days: f64) -> Option<f64> {
    if !iv.is_finite() || iv < 0.0 {
        return None;
    }
    Some(iv * horizon_factor(days)?)
}

/// `emAbs / (spot · sqrt(days/365))`
pub fn iv_ann_from_em_abs(em_abs: f64, spot: f64, days: f64) -> Option<f64> {
    let spot = positive(spot)?;
    if !em_abs.is_finite() {
        return None;
    }
    Some(em_abs.abs() / (spot * horizon_factor(days)?))
}

/// `emPct / sqrt(days/365)`
pub fn iv_ann_from_em_pct(em_pct: f64, days: f64) -> Option<f64> {
    if !em_pct.is_finite() {
        return None;
    }
    Some(em_pct.abs() / horizon_factor(days)?)
}

/// # Summary
/// 隐含波动率单位归一：大于 2 的数值视为百分点并除以 100。
pub fn normalize_iv(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    Some(if raw > IV_PERCENT_POINT_THRESHOLD { raw / 100.0 } else { raw })
}

/// 含糊字段的判定结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmbiguousMove {
    // 小数形式的百分比
    Percent(f64),
    // 美元绝对值
    Absolute(f64),
}

/// # Summary
/// 单位不明的预期波动字段的启发式判定。
///
/// # Logic
/// 现价大于 20 且数值不大于 3 时判定为百分比 (小数)，否则判定为绝对值。
/// 这是一个可能猜错的启发式，集中在此处以便日后替换为显式单位标注。
pub fn interpret_ambiguous_move(value: f64, spot: Option<f64>) -> AmbiguousMove {
    match spot {
        Some(s) if s > AMBIGUOUS_SPOT_FLOOR && value <= AMBIGUOUS_PERCENT_CEILING => {
            AmbiguousMove::Percent(value)
        }
        _ => AmbiguousMove::Absolute(value),
    }
}

/// # Summary
/// 按目标期限挑选记录。
///
/// # Logic
/// 1. 没有可解析天数的记录不参与挑选。
/// 2. 天数与目标完全相等者优先。
/// 3. 否则取天数差绝对值最小者，平局保留先出现的记录。
///
/// # Returns
/// `(下标, 记录天数)`。
pub fn select_tenor(points: &[Record], target_days: f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, point) in points.iter().enumerate() {
        let Some(days) = probe::DAYS.number(point) else {
            continue;
        };
        let diff = (days - target_days).abs();
        if diff == 0.0 {
            return Some((i, days));
        }
        match best {
            Some((_, _, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, days, diff)),
        }
    }
    best.map(|(i, days, _)| (i, days))
}

/// # Summary
/// 将异构的预期波动数据调和为统一结构。
///
/// # Logic
/// 1. 选择期限最匹配的点记录；没有则使用顶层记录；都没有时来源为 `none`。
/// 2. 现价按 点记录 → 顶层记录 → `spot_hint` 的顺序取第一个正值。
/// 3. 绝对值与百分比优先取显式字段；都缺失时对含糊字段做启发式判定。
/// 4. 用现价回填缺失的一侧。
/// 5. 隐含波动率取显式字段 (大于 2 按百分点处理)，否则由绝对值反推。
/// 6. 仍没有波动数值但有隐含波动率时，按标准公式推出。
///
/// # Arguments
/// * `snapshot`: 点列表与顶层兜底记录。
/// * `target_days`: 目标期限 (天)。
/// * `spot_hint`: 调用方已知的现价，例如最新收盘价。
///
/// # Returns
/// 总是返回结果，无法推导的字段为 None，推导路径记录在 `move_basis`/`iv_basis`。
pub fn pick_expected_move(
    snapshot: &ExpectedMoveSnapshot,
    target_days: f64,
    spot_hint: Option<f64>,
) -> ExpectedMovePick {
    let state = snapshot.state.as_ref();
    let (record, source) = match select_tenor(&snapshot.points, target_days) {
        Some((i, _)) => (snapshot.points.get(i), MoveSource::Point),
        None if state.is_some() => (state, MoveSource::State),
        None => (None, MoveSource::None),
    };

    let spot = record
        .and_then(|r| probe::SPOT.number(r))
        .filter(|s| *s > 0.0)
        .or_else(|| state.and_then(|r| probe::SPOT.number(r)).filter(|s| *s > 0.0))
        .or_else(|| spot_hint.and_then(positive));

    let Some(record) = record else {
        return ExpectedMovePick {
            days: positive(target_days),
            as_of: None,
            spot,
            expiry_timestamp: None,
            absolute_move: None,
            percent_move: None,
            annualized_implied_vol: None,
            source,
            move_basis: MoveBasis::Unavailable,
            iv_basis: IvBasis::Unavailable,
        };
    };

    let days = probe::DAYS
        .number(record)
        .and_then(positive)
        .or_else(|| positive(target_days));

    let mut absolute = probe::ABSOLUTE_MOVE.number(record).map(f64::abs);
    let mut percent = probe::PERCENT_MOVE.number(record).map(f64::abs);
    let mut move_basis = if absolute.is_some() || percent.is_some() {
        MoveBasis::Explicit
    } else {
        MoveBasis::Unavailable
    };
    if move_basis == MoveBasis::Unavailable {
        if let Some(value) = probe::AMBIGUOUS_MOVE.number(record).map(f64::abs) {
            match interpret_ambiguous_move(value, spot) {
                AmbiguousMove::Percent(p) => {
                    percent = Some(p);
                    move_basis = MoveBasis::AmbiguousAsPercent;
                }
                AmbiguousMove::Absolute(a) => {
                    absolute = Some(a);
                    move_basis = MoveBasis::AmbiguousAsAbsolute;
                }
            }
        }
    }

    if let Some(s) = spot {
        match (absolute, percent) {
            (None, Some(p)) => absolute = Some(s * p),
            (Some(a), None) => percent = Some(a / s),
            _ => {}
        }
    }

    let explicit_iv = probe::IMPLIED_VOL.number(record).and_then(normalize_iv);
    let inverted_iv = || {
        let (a, s, d) = (absolute?, spot?, days?);
        iv_ann_from_em_abs(a, s, d)
    };
    let (iv, iv_basis) = match explicit_iv {
        Some(iv) => (Some(iv), IvBasis::Explicit),
        None => match inverted_iv() {
            Some(iv) => (Some(iv), IvBasis::InvertedFromMove),
            None => (None, IvBasis::Unavailable),
        },
    };

    if move_basis == MoveBasis::Unavailable {
        if let (Some(iv), Some(d)) = (iv, days) {
            percent = em_pct_from_iv(iv, d);
            absolute = spot.and_then(|s| em_abs_from_spot_iv(s, iv, d));
            if percent.is_some() {
                move_basis = MoveBasis::FromImpliedVol;
            }
        }
    }

    ExpectedMovePick {
        days,
        as_of: probe::AS_OF
            .timestamp_ms(record)
            .or_else(|| state.and_then(|r| probe::AS_OF.timestamp_ms(r))),
        spot,
        expiry_timestamp: probe::EXPIRY.timestamp_ms(record),
        absolute_move: absolute,
        percent_move: percent,
        annualized_implied_vol: iv,
        source,
        move_basis,
        iv_basis,
    }
}
