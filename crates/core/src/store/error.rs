use thiserror::Error;

/// # Summary
/// 快照存储错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 写入失败
    #[error("Write error: {0}")]
    Write(String),
    /// 快照负载无法序列化
    #[error("Serialize error: {0}")]
    Serialize(String),
    /// 未知或未分类的错误
    #[error("Unknown error: {0}")]
    Unknown(String),
}
