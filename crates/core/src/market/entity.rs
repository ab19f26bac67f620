use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 数据源原样提供的 K 线记录，字段可能缺失或为非有限值。
///
/// # Invariants
/// - 仅作为 `normalize` 的输入，任何指标计算都不得直接消费此类型。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCandle {
    // 毫秒时间戳，部分数据源以浮点数下发
    #[serde(default, alias = "t", alias = "time", alias = "ts")]
    pub timestamp: Option<f64>,
    #[serde(default, alias = "o")]
    pub open: Option<f64>,
    #[serde(default, alias = "h")]
    pub high: Option<f64>,
    #[serde(default, alias = "l")]
    pub low: Option<f64>,
    #[serde(default, alias = "c")]
    pub close: Option<f64>,
    #[serde(default, alias = "v")]
    pub volume: Option<f64>,
}

impl From<Candle> for RawCandle {
    fn from(c: Candle) -> Self {
        // 毫秒时间戳在 ±2^53 内可被 f64 精确表示
        #[allow(clippy::cast_precision_loss)]
        let timestamp = c.timestamp as f64;
        Self {
            timestamp: Some(timestamp),
            open: Some(c.open),
            high: Some(c.high),
            low: Some(c.low),
            close: Some(c.close),
            volume: c.volume,
        }
    }
}

/// # Summary
/// 经过校验的单根 K 线。
///
/// # Invariants
/// - `close` 始终为有限值。
/// - `open/high/low` 缺失或非有限时已回填为 `close`。
/// - `volume` 为 None 表示无成交量信息：VWAP 中不计权重，其他场景按 0 处理。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    // K 线开始时间 (毫秒)
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// 以同一价格构造 OHLC 相同的 K 线
    pub fn flat(timestamp: i64, close: f64) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
        }
    }

    /// 典型价格 `(high + low + close) / 3`
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// 高低价差
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// 转换为 UTC 时间，时间戳越界时返回 None
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// # Summary
/// 隐含波动率时间序列中的单点，`percent_value` 以百分点表示 (例如 18.5 表示 18.5%)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IvPoint {
    #[serde(alias = "t", alias = "ts", alias = "time")]
    pub timestamp: i64,
    #[serde(rename = "percentValue", alias = "percent_value", alias = "value", alias = "iv")]
    pub percent_value: f64,
}

/// # Summary
/// 指标引擎对每根输入 K 线输出的一条记录。
///
/// # Invariants
/// - 历史不足时对应字段保持 None：ATR/DI 需要 `period + 1` 根，首个 ADX 落在下标 `2·period − 1`。
/// - 平滑递推一旦获得种子值即不再重新播种。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct IndicatorPoint {
    pub timestamp: i64,
    pub tr: Option<f64>,
    pub atr: Option<f64>,
    #[serde(rename = "diPlus")]
    pub di_plus: Option<f64>,
    #[serde(rename = "diMinus")]
    pub di_minus: Option<f64>,
    pub dx: Option<f64>,
    pub adx: Option<f64>,
}

/// # Summary
/// 锚点类型，仅用于展示标签。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AnchorKind {
    // 摆动高点
    High,
    // 摆动低点
    Low,
    // 当月第一根 K 线
    MonthOpen,
    // 区间 × 成交量最大的事件 K 线
    Event,
}

/// # Summary
/// VWAP 窗口的起点。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Anchor {
    // 在已排序 K 线序列中的下标
    pub index: usize,
    pub timestamp: i64,
    pub kind: AnchorKind,
}
