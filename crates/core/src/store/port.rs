use super::entity::KpiSnapshot;
use super::error::StoreError;
use async_trait::async_trait;

/// # Summary
/// 快照持久化接口（外部持久层）。
///
/// # Invariants
/// - 以追加方式写入，不修改已写入的快照。
/// - 计算内核从不直接调用，只由服务层在计算完成后写入。
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// # Summary
    /// 追加一条 KPI 快照。
    ///
    /// # Arguments
    /// * `snapshot`: 待写入的快照。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `StoreError`。
    async fn append(&self, snapshot: &KpiSnapshot) -> Result<(), StoreError>;

    /// # Summary
    /// 读取某标的某 KPI 最近一次写入的快照。
    async fn latest(&self, symbol: &str, kpi_id: &str) -> Result<Option<KpiSnapshot>, StoreError>;
}
