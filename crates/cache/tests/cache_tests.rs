use meridian_cache::mem::MemCache;
use meridian_core::cache::error::CacheError;
use meridian_core::cache::port::{Cache, CacheExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Quote {
    symbol: String,
    last: f64,
}

#[tokio::test]
async fn test_mem_cache_raw_ops() {
    let cache = MemCache::new();
    let key = "raw_key";
    let value = vec![1, 2, 3, 4];

    // 测试存取
    cache.set_raw(key, value.clone(), None).await.unwrap();
    let result = cache.get_raw(key).await.unwrap().unwrap();
    assert_eq!(result, value);

    // 测试删除
    cache.del(key).await.unwrap();
    assert!(cache.get_raw(key).await.unwrap().is_none());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_mem_cache_typed_ops() {
    let cache = MemCache::new();
    let item = Quote {
        symbol: "SPY".to_string(),
        last: 512.25,
    };

    cache.set("quote:SPY", &item, None).await.unwrap();
    let result: Quote = cache.get("quote:SPY").await.unwrap().unwrap();
    assert_eq!(result, item);

    // 类型不匹配时报告反序列化错误
    let wrong: Result<Option<Vec<u32>>, CacheError> = cache.get("quote:SPY").await;
    assert!(matches!(wrong, Err(CacheError::Deserialize(_))));
}

#[tokio::test(start_paused = true)]
async fn test_entries_expire_after_ttl() {
    let cache = MemCache::new();
    cache
        .set_raw("short", vec![1], Some(Duration::from_secs(60)))
        .await
        .unwrap();
    cache.set_raw("forever", vec![2], None).await.unwrap();

    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(cache.get_raw("short").await.unwrap(), Some(vec![1]));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get_raw("short").await.unwrap().is_none());
    assert_eq!(cache.get_raw("forever").await.unwrap(), Some(vec![2]));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_or_load_coalesces_concurrent_loads() {
    let cache = Arc::new(MemCache::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_load_raw(
                    "candles:SPY",
                    Some(Duration::from_secs(60)),
                    Box::pin(async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(vec![42])
                    }),
                )
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), vec![42]);
    }
    // 只有一个加载任务真正执行
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_or_load_reloads_after_expiry() {
    let cache = MemCache::new();
    let calls = AtomicUsize::new(0);
    let ttl = Some(Duration::from_secs(10));

    for _ in 0..2 {
        let value = cache
            .get_or_load_raw(
                "iv:SPY",
                ttl,
                Box::pin(async {
                    Ok(vec![u8::try_from(calls.fetch_add(1, Ordering::SeqCst)).unwrap()])
                }),
            )
            .await
            .unwrap();
        assert_eq!(value, vec![0]);
    }

    tokio::time::advance(Duration::from_secs(11)).await;
    let value = cache
        .get_or_load_raw("iv:SPY", ttl, Box::pin(async { Ok(vec![9]) }))
        .await
        .unwrap();
    assert_eq!(value, vec![9]);
}

#[tokio::test]
async fn test_failed_load_is_not_cached() {
    let cache = MemCache::new();
    let err = cache
        .get_or_load_raw(
            "gamma:SPY",
            None,
            Box::pin(async { Err(CacheError::Load("upstream down".to_string())) }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Load(_)));
    assert!(cache.get_raw("gamma:SPY").await.unwrap().is_none());

    let value = cache
        .get_or_load_raw("gamma:SPY", None, Box::pin(async { Ok(vec![1]) }))
        .await
        .unwrap();
    assert_eq!(value, vec![1]);
}
