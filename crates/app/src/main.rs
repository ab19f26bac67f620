mod fixture;
mod logging;
mod settings;

use fixture::JsonFixtureSource;
use meridian_cache::market::CachedMarketData;
use meridian_cache::mem::MemCache;
use meridian_core::common::time::RealTimeProvider;
use meridian_dashboard::service::KpiService;
use meridian_dashboard::store::MemSnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 KpiService。
///
/// # Logic
/// 1. 加载配置 (第一个命令行参数可指定配置文件)。
/// 2. 初始化全局日志。
/// 3. 实例化基础设施层（JSON 数据源、缓存、快照存储）。
/// 4. 构造应用服务层（KpiService）。
/// 5. 逐个标的执行 KPI 计算，报告以 JSON 输出到标准输出。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载配置
    let config_path = std::env::args().nth(1);
    let config = settings::load(config_path.as_deref())?;

    // 2. 初始化日志，守卫需存活到进程结束
    let _log_guard = logging::init(&config.logging)?;
    info!("Meridian starting with data dir {}", config.data.dir);

    // 3. 实例化基础设施层
    let source = Arc::new(JsonFixtureSource::new(&config.data.dir));
    let cache = Arc::new(MemCache::new());
    let market = Arc::new(CachedMarketData::new(
        source.clone(),
        cache,
        Duration::from_secs(config.cache.ttl_secs),
    ));
    let store = Arc::new(MemSnapshotStore::new());

    // 4. 构造应用服务层（注入 Core Trait 抽象）
    let service = KpiService::new(
        market,
        source,
        store.clone(),
        Arc::new(RealTimeProvider),
        config.analytics.clone(),
    );

    // 5. 逐个标的计算
    let mut failures = 0usize;
    for symbol in &config.data.symbols {
        match service.run(symbol).await {
            Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
            Err(e) => {
                failures += 1;
                error!("KPI run for {} failed: {}", symbol, e);
            }
        }
    }

    info!(
        "Done: {} symbols, {} failed, {} snapshots stored",
        config.data.symbols.len(),
        failures,
        store.len()
    );
    if failures == config.data.symbols.len() && failures > 0 {
        return Err("every KPI run failed".into());
    }
    Ok(())
}
