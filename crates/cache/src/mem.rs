use async_trait::async_trait;
use dashmap::DashMap;
use meridian_core::cache::error::CacheError;
use meridian_core::cache::port::{Cache, LoadFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// 单个缓存条目
struct Entry {
    value: Vec<u8>,
    // None 表示永不过期
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|t| now < t)
    }
}

/// # Summary
/// 基于 DashMap 的内存缓存实现，支持按条目过期与同键回源合并。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 过期判断使用 `tokio::time::Instant`，测试中可通过暂停时钟推进时间。
/// - 同一个键同一时刻最多只有一个回源任务在运行。
pub struct MemCache {
    // 线程安全的 KV 存储容器
    storage: DashMap<String, Entry>,
    // 每个键的回源闸门，持有锁者负责加载
    loading: DashMap<String, Arc<Mutex<()>>>,
}

impl MemCache {
    /// # Summary
    /// 创建一个新的 MemCache 实例。
    ///
    /// # Returns
    /// * `Self` - 初始化的缓存实例。
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
            loading: DashMap::new(),
        }
    }

    /// 当前存活的条目数量，顺带清理已过期的条目
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.storage.retain(|_, entry| entry.is_live(now));
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        if let Some(entry) = self.storage.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        }
        // 过期条目惰性删除
        self.storage.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    fn store(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.storage
            .insert(key.to_string(), Entry { value, expires_at });
    }

    fn gate(&self, key: &str) -> Arc<Mutex<()>> {
        self.loading
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemCache {
    /// # Summary
    /// 设置原始字节数据。
    ///
    /// # Logic
    /// 将 Key 转换为 String 后与 Value 及过期时刻一并插入哈希表。若存在同名 Key 则覆盖。
    async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.store(key, value, ttl);
        Ok(())
    }

    /// # Summary
    /// 获取原始字节数据，过期条目视为不存在并被移除。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }

    /// # Summary
    /// 读取缓存，未命中时合并同键的并发回源。
    ///
    /// # Logic
    /// 1. 命中直接返回。
    /// 2. 获取该键的回源闸门；等待期间其他调用方可能已完成加载，拿到锁后再查一次。
    /// 3. 仍未命中则执行 `loader`，成功结果按 `ttl` 写入，失败不写入。
    /// 4. 没有其他等待者时回收闸门。
    async fn get_or_load_raw<'a>(
        &'a self,
        key: &'a str,
        ttl: Option<Duration>,
        loader: LoadFuture<'a>,
    ) -> Result<Vec<u8>, CacheError> {
        if let Some(hit) = self.lookup(key) {
            return Ok(hit);
        }

        let gate = self.gate(key);
        let result = {
            let _guard = gate.lock().await;
            match self.lookup(key) {
                Some(hit) => {
                    debug!("Cache key {} filled by a concurrent loader", key);
                    Ok(hit)
                }
                None => {
                    debug!("Cache miss for {}, loading", key);
                    let loaded = loader.await;
                    if let Ok(bytes) = &loaded {
                        self.store(key, bytes.clone(), ttl);
                    }
                    loaded
                }
            }
        };

        // 表内一份、本地一份，强引用数为 2 说明已无等待者
        self.loading
            .remove_if(key, |_, g| Arc::ptr_eq(g, &gate) && Arc::strong_count(g) <= 2);
        drop(gate);
        result
    }
}
