use crate::common::Resolution;
use crate::market::entity::{IvPoint, RawCandle};
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// # Summary
/// 行情数据提供者接口（外部拉取层）。
///
/// # Invariants
/// - 返回的数据不保证有序，也不保证无缺口；调用方必须先经过归一化。
/// - 重试、限流与缓存属于实现方或装饰器，不属于计算内核。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取特定标的在指定时间范围内的 K 线数据。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码。
    /// * `resolution`: K 线周期。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回原始 K 线列表。
    async fn fetch_candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawCandle>, MarketError>;

    /// # Summary
    /// 获取特定标的的隐含波动率时间序列 (百分点)。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回隐含波动率点列表。
    async fn fetch_iv_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<IvPoint>, MarketError>;
}
