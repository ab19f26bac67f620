use crate::cache::error::CacheError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// # Summary
/// 回源加载任务。只有在缓存未命中且当前调用方获得加载权时才会被 poll。
pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, CacheError>> + Send + 'a>>;

/// # Summary
/// 业务无关的异步 KV 缓存接口 (Port)，带过期时间与并发回源合并。
///
/// # Invariants
/// - 处理原始字节，确保 Trait 是对象安全的 (Object Safe)。
/// - 缓存对象以 `Arc` 句柄显式传递，生命周期由进程或请求作用域决定，不存在全局缓存。
#[async_trait]
pub trait Cache: Send + Sync {
    /// # Summary
    /// 设置原始字节数据。
    ///
    /// # Arguments
    /// * `key`: 唯一键。
    /// * `value`: 原始字节数组。
    /// * `ttl`: 有效期，None 表示永不过期。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `CacheError`。
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// # Summary
    /// 获取原始字节数据。
    ///
    /// # Logic
    /// 1. 根据键检索存储内容。
    /// 2. 已过期的条目视为不存在。
    ///
    /// # Returns
    /// 存在且未过期则返回 `Some(Vec<u8>)`，否则返回 `None`。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// # Summary
    /// 删除指定键。
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// # Summary
    /// 读取缓存，未命中时执行回源加载并写入缓存。
    ///
    /// # Logic
    /// 1. 命中则直接返回。
    /// 2. 同一个键同一时刻只允许一个加载任务运行，其余调用方等待后读取其结果。
    /// 3. 加载失败不写入缓存，错误原样返回。
    ///
    /// # Arguments
    /// * `key`: 唯一键。
    /// * `ttl`: 写入时使用的有效期。
    /// * `loader`: 回源加载任务。
    async fn get_or_load_raw<'a>(
        &'a self,
        key: &'a str,
        ttl: Option<Duration>,
        loader: LoadFuture<'a>,
    ) -> Result<Vec<u8>, CacheError>;
}

/// # Summary
/// 缓存泛型扩展接口，提供便捷的序列化支持。
///
/// # Invariants
/// - 自动为所有实现 `Cache` 的类型提供支持。
#[async_trait]
pub trait CacheExt: Cache {
    /// # Summary
    /// 以 JSON 序列化后存入强类型对象。
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialize(e.to_string()))?;
        self.set_raw(key, bytes, ttl).await
    }

    /// # Summary
    /// 取出并反序列化强类型对象。
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key).await? {
            Some(bytes) => {
                let val = serde_json::from_slice(&bytes)
                    .map_err(|e| CacheError::Deserialize(e.to_string()))?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}
