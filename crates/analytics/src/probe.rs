//! 异构记录的字段探测。
//!
//! 不同生产方对同一含义的字段命名不一致，每个含义对应一张有序候选键表，
//! 按顺序尝试，第一个能解析为有限数值的键胜出。探测顺序本身即为可审阅的约定。

use chrono::DateTime;
use meridian_core::options::entity::{Record, StrikeRecord};
use serde_json::Value;

use crate::num::millis_from_f64;

/// # Summary
/// 单个语义字段的有序候选键表。
#[derive(Debug, Clone, Copy)]
pub struct FieldProbe {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

impl FieldProbe {
    pub const fn new(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self { name, keys }
    }

    /// # Summary
    /// 按顺序探测第一个有限数值。
    ///
    /// # Logic
    /// 数字直接采用；字符串尝试解析为浮点数；null、非有限值及其他类型视为缺失并继续尝试下一个键。
    pub fn number(&self, record: &Record) -> Option<f64> {
        self.keys
            .iter()
            .find_map(|key| record.get(*key).and_then(value_as_f64))
    }

    /// # Summary
    /// 按顺序探测第一个可解析的毫秒时间戳，支持数字与 RFC 3339 字符串。
    pub fn timestamp_ms(&self, record: &Record) -> Option<i64> {
        self.keys.iter().find_map(|key| match record.get(*key)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.timestamp_millis())
                .or_else(|| s.trim().parse::<f64>().ok().and_then(millis_from_f64)),
            other => value_as_f64(other).and_then(millis_from_f64),
        })
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

pub const STRIKE: FieldProbe = FieldProbe::new("strike", &["strike", "strikePrice", "strike_price", "k", "level"]);

pub const GAMMA: FieldProbe = FieldProbe::new(
    "gamma",
    &["gammaAbs", "gamma_abs", "gex", "netGamma", "gammaExposure", "gamma", "value"],
);

pub const OPEN_INTEREST: FieldProbe = FieldProbe::new(
    "openInterest",
    &["oiAbs", "oi_abs", "openInterest", "open_interest", "totalOi", "oi", "value"],
);

pub const DAYS: FieldProbe = FieldProbe::new("days", &["days", "horizonDays", "tenorDays", "dte"]);

pub const SPOT: FieldProbe = FieldProbe::new(
    "spot",
    &["spot", "spotPrice", "underlyingPrice", "underlying", "price", "last"],
);

pub const ABSOLUTE_MOVE: FieldProbe = FieldProbe::new(
    "absoluteMove",
    &["emAbs", "expectedMoveUsd", "expectedMoveAbs", "absoluteMove", "moveAbs"],
);

/// 百分比字段按小数解释 (0.05 即 5%)
pub const PERCENT_MOVE: FieldProbe = FieldProbe::new(
    "percentMove",
    &["emPct", "expectedMovePct", "percentMove", "movePct"],
);

/// 单位不明的含糊字段，需经启发式判定
pub const AMBIGUOUS_MOVE: FieldProbe = FieldProbe::new("em", &["em", "expectedMove", "move"]);

pub const IMPLIED_VOL: FieldProbe = FieldProbe::new(
    "impliedVol",
    &["iv", "ivAnn", "annualizedIv", "impliedVol", "impliedVolatility", "atmIv"],
);

pub const AS_OF: FieldProbe = FieldProbe::new("asOf", &["asOf", "as_of", "timestamp", "ts", "updatedAt"]);

pub const EXPIRY: FieldProbe = FieldProbe::new(
    "expiryTimestamp",
    &["expiryTimestamp", "expiry", "expiration", "expirationDate"],
);

/// # Summary
/// 将一组行权价记录探测为 `(strike, value)`。
///
/// # Logic
/// 行权价或数值缺失的记录直接丢弃，不做补零。
pub fn strike_records(records: &[Record], value: &FieldProbe) -> Vec<StrikeRecord> {
    records
        .iter()
        .filter_map(|r| {
            Some(StrikeRecord {
                strike: STRIKE.number(r)?,
                value: value.number(r)?,
            })
        })
        .collect()
}
