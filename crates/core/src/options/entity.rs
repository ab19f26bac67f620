use serde::{Deserialize, Serialize};

/// # Summary
/// 期权快照源下发的异构记录：同一含义的字段在不同生产方命名不一致。
pub type Record = serde_json::Map<String, serde_json::Value>;

/// # Summary
/// 按行权价探测后得到的单条指标记录 (Gamma 敞口或未平仓量)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StrikeRecord {
    pub strike: f64,
    pub value: f64,
}

/// # Summary
/// 行权价分类。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    Support,
    Resistance,
    Magnet,
    None,
}

/// # Summary
/// 单个行权价的综合评分与分类。
///
/// # Invariants
/// - `score ∈ [0, 1]`，由归一化后的 Gamma 与 OI 加权得到。
/// - 仅相对于构建时使用的现价与窗口有效，不做持久化。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StrikeBucket {
    pub strike: f64,
    pub score: f64,
    pub kind: BucketKind,
    // 归一化后的 Gamma 分量
    #[serde(rename = "gammaScore")]
    pub gamma_score: f64,
    // 归一化后的 OI 分量
    #[serde(rename = "oiScore")]
    pub oi_score: f64,
}

/// # Summary
/// 支撑/阻力排行表中的一行。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelRow {
    // 例如 "Main support"、"Resistance #2"
    pub label: String,
    pub strike: f64,
    pub score: f64,
    // 相对现价的百分比距离，现价缺失时为 None
    #[serde(rename = "distancePct")]
    pub distance_pct: Option<f64>,
}

/// # Summary
/// 行权价聚合的最终结果。
///
/// # Invariants
/// - 每次输入变化（现价或快照）都重新构建，从不原地修改。
/// - 排行表每侧最多 3 行。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StrikeMapState {
    #[serde(rename = "pinStrike")]
    pub pin_strike: Option<f64>,
    // (pin − spot) / spot × 100
    #[serde(rename = "pinDistancePct")]
    pub pin_distance_pct: Option<f64>,
    #[serde(rename = "mainSupport")]
    pub main_support: Option<f64>,
    #[serde(rename = "mainResistance")]
    pub main_resistance: Option<f64>,
    pub buckets: Vec<StrikeBucket>,
    #[serde(rename = "supportRows")]
    pub support_rows: Vec<LevelRow>,
    #[serde(rename = "resistanceRows")]
    pub resistance_rows: Vec<LevelRow>,
}

/// # Summary
/// 预期波动结果的来源。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoveSource {
    // 使用了按期限的单条记录
    Point,
    // 只有顶层兜底记录
    State,
    None,
}

/// # Summary
/// 预期波动数值的推导方式，供调用方排查启发式判断。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MoveBasis {
    // 显式的绝对值或百分比字段
    Explicit,
    // 含糊字段被判定为百分比 (小数)
    AmbiguousAsPercent,
    // 含糊字段被判定为美元绝对值
    AmbiguousAsAbsolute,
    // 由隐含波动率按标准公式推出
    FromImpliedVol,
    Unavailable,
}

/// # Summary
/// 年化隐含波动率的推导方式。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum IvBasis {
    Explicit,
    // 由绝对波动反推
    InvertedFromMove,
    Unavailable,
}

/// # Summary
/// 调和后的预期波动结果。
///
/// # Invariants
/// - 当绝对值与百分比都可推导时，`absolute_move ≈ spot × percent_move`。
/// - `percent_move` 为小数 (0.05 即 5%)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExpectedMovePick {
    pub days: Option<f64>,
    #[serde(rename = "asOf")]
    pub as_of: Option<i64>,
    pub spot: Option<f64>,
    #[serde(rename = "expiryTimestamp")]
    pub expiry_timestamp: Option<i64>,
    #[serde(rename = "absoluteMove")]
    pub absolute_move: Option<f64>,
    #[serde(rename = "percentMove")]
    pub percent_move: Option<f64>,
    #[serde(rename = "annualizedImpliedVol")]
    pub annualized_implied_vol: Option<f64>,
    pub source: MoveSource,
    #[serde(rename = "moveBasis")]
    pub move_basis: MoveBasis,
    #[serde(rename = "ivBasis")]
    pub iv_basis: IvBasis,
}

/// # Summary
/// 快照源提供的预期波动数据：按期限的点列表加一个顶层兜底记录。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpectedMoveSnapshot {
    #[serde(default)]
    pub points: Vec<Record>,
    #[serde(default)]
    pub state: Option<Record>,
}
