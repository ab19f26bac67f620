use async_trait::async_trait;
use dashmap::DashMap;
use meridian_core::store::entity::KpiSnapshot;
use meridian_core::store::error::StoreError;
use meridian_core::store::port::SnapshotStore;

/// # Summary
/// 基于 DashMap 的内存快照存储，供二进制与测试使用。
///
/// # Invariants
/// - 只追加，不修改已写入的快照。
/// - 同一 `(symbol, kpi_id)` 的快照按写入顺序保存，最后一条即最新值。
#[derive(Default)]
pub struct MemSnapshotStore {
    // Key 为 "{symbol}:{kpi_id}"
    log: DashMap<String, Vec<KpiSnapshot>>,
}

impl MemSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(symbol: &str, kpi_id: &str) -> String {
        format!("{}:{}", symbol, kpi_id)
    }

    /// 某标的某 KPI 的全部历史快照，按写入顺序
    pub fn history(&self, symbol: &str, kpi_id: &str) -> Vec<KpiSnapshot> {
        self.log
            .get(&Self::key(symbol, kpi_id))
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }

    /// 已写入的快照总数
    pub fn len(&self) -> usize {
        self.log.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for MemSnapshotStore {
    async fn append(&self, snapshot: &KpiSnapshot) -> Result<(), StoreError> {
        self.log
            .entry(Self::key(&snapshot.symbol, &snapshot.kpi_id))
            .or_default()
            .push(snapshot.clone());
        Ok(())
    }

    async fn latest(&self, symbol: &str, kpi_id: &str) -> Result<Option<KpiSnapshot>, StoreError> {
        Ok(self
            .log
            .get(&Self::key(symbol, kpi_id))
            .and_then(|v| v.value().last().cloned()))
    }
}
