use thiserror::Error;

/// # Summary
/// 缓存域错误枚举，处理序列化及加载失败。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum CacheError {
    // 数据序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 数据反序列化失败
    #[error("Deserialize error: {0}")]
    Deserialize(String),
    // 回源加载失败，失败结果不会写入缓存
    #[error("Load error: {0}")]
    Load(String),
}
