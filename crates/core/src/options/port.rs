use crate::market::error::MarketError;
use crate::options::entity::{ExpectedMoveSnapshot, Record};
use async_trait::async_trait;

/// # Summary
/// 期权快照源接口（外部拉取层）。
///
/// # Invariants
/// - 记录字段命名不统一，调用方必须按有序探测列表取值。
#[async_trait]
pub trait OptionsSnapshotSource: Send + Sync {
    /// 获取按行权价的 Gamma 敞口记录
    async fn fetch_gamma(&self, symbol: &str) -> Result<Vec<Record>, MarketError>;

    /// 获取按行权价的未平仓量记录
    async fn fetch_open_interest(&self, symbol: &str) -> Result<Vec<Record>, MarketError>;

    /// 获取预期波动快照
    async fn fetch_expected_moves(&self, symbol: &str)
    -> Result<ExpectedMoveSnapshot, MarketError>;
}
