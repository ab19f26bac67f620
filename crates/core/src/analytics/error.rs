use thiserror::Error;

/// # Summary
/// 计算内核唯一会返回的致命错误。
///
/// # Invariants
/// - 历史不足一律以 `None` 表达，不使用此枚举。
/// - 仅在结果会变得无意义时返回，例如回测的期限或回看天数为 0。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
