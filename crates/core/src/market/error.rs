use thiserror::Error;

/// # Summary
/// 行情拉取域错误枚举，处理网络、解析及数据缺失等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 计算内核从不产生此类错误，仅由拉取层与服务层使用。
#[derive(Error, Debug)]
pub enum MarketError {
    // 网络层错误，包含底层客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 数据解析错误，如 JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求的数据未找到
    #[error("Data not found: {0}")]
    NotFound(String),
    // 未知或未分类的错误
    #[error("Unknown error: {0}")]
    Unknown(String),
}
