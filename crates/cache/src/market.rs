use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::cache::error::CacheError;
use meridian_core::cache::port::Cache;
use meridian_core::common::Resolution;
use meridian_core::market::entity::{IvPoint, RawCandle};
use meridian_core::market::error::MarketError;
use meridian_core::market::port::MarketDataProvider;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// # Summary
/// 行情拉取的缓存装饰器：相同请求在有效期内只回源一次，并发的相同请求合并为一次回源。
///
/// # Invariants
/// - 缓存键由标的、周期、窗口跨度与按 K 线周期取整的结束时间组成：
///   同一根 K 线内发起的相同跨度请求共享条目，参数不同的请求互不影响。
/// - 回源失败不写入缓存，原始 `MarketError` 原样返回给调用方。
pub struct CachedMarketData {
    inner: Arc<dyn MarketDataProvider>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CachedMarketData {
    /// # Summary
    /// 包装一个行情提供者。
    ///
    /// # Arguments
    /// * `inner`: 真正回源的提供者。
    /// * `cache`: 共享的缓存句柄，由进程或请求作用域持有。
    /// * `ttl`: 条目有效期。
    pub fn new(inner: Arc<dyn MarketDataProvider>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    /// # Summary
    /// 通过缓存执行一次回源。
    ///
    /// # Logic
    /// 1. 回源成功时序列化为 JSON 字节交给缓存保存。
    /// 2. 回源失败时把原始错误放入本地槽位，缓存层只看到 `CacheError::Load`。
    /// 3. 命中或加载完成后反序列化为强类型结果。
    async fn through_cache<T, F>(&self, key: &str, fetch: F) -> Result<T, MarketError>
    where
        T: Serialize + DeserializeOwned + Send,
        F: Future<Output = Result<T, MarketError>> + Send,
    {
        let failure: Mutex<Option<MarketError>> = Mutex::new(None);
        let loader = Box::pin(async {
            match fetch.await {
                Ok(rows) => serde_json::to_vec(&rows).map_err(|e| CacheError::Serialize(e.to_string())),
                Err(e) => {
                    let message = e.to_string();
                    if let Ok(mut slot) = failure.lock() {
                        *slot = Some(e);
                    }
                    Err(CacheError::Load(message))
                }
            }
        });

        let loaded = self.cache.get_or_load_raw(key, Some(self.ttl), loader).await;
        let bytes = match loaded {
            Ok(bytes) => bytes,
            Err(e) => {
                let original = failure.into_inner().ok().flatten();
                return Err(original.unwrap_or_else(|| {
                    warn!("Cache failure for {}: {}", key, e);
                    MarketError::Unknown(e.to_string())
                }));
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| MarketError::Parse(e.to_string()))
    }
}

/// 隐含波动率按日更新
const IV_BUCKET_MS: i64 = 86_400_000;

/// 窗口的缓存键片段：`{跨度毫秒}:{结束时间所在的桶序号}`
fn window_key(start: DateTime<Utc>, end: DateTime<Utc>, bucket_ms: i64) -> String {
    let end_ms = end.timestamp_millis();
    let span = end_ms.saturating_sub(start.timestamp_millis());
    format!("{}:{}", span, end_ms.div_euclid(bucket_ms.max(1)))
}

#[async_trait]
impl MarketDataProvider for CachedMarketData {
    async fn fetch_candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawCandle>, MarketError> {
        let bucket_ms = i64::from(resolution.minutes()) * 60_000;
        let key = format!(
            "candles:{}:{}:{}",
            symbol,
            resolution,
            window_key(start, end, bucket_ms)
        );
        self.through_cache(&key, self.inner.fetch_candles(symbol, resolution, start, end))
            .await
    }

    async fn fetch_iv_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<IvPoint>, MarketError> {
        let key = format!("iv:{}:{}", symbol, window_key(start, end, IV_BUCKET_MS));
        self.through_cache(&key, self.inner.fetch_iv_series(symbol, start, end))
            .await
    }
}
