use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::common::Resolution;
use meridian_core::market::entity::{IvPoint, RawCandle};
use meridian_core::market::error::MarketError;
use meridian_core::market::port::MarketDataProvider;
use meridian_core::options::entity::{ExpectedMoveSnapshot, Record};
use meridian_core::options::port::OptionsSnapshotSource;
use meridian_core::store::entity::KpiSnapshot;
use meridian_core::store::error::StoreError;
use meridian_core::store::port::SnapshotStore;
use meridian_dashboard::store::MemSnapshotStore;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 返回固定数据的行情源，`None` 表示该接口拉取失败
pub struct MockMarket {
    pub candles: Option<Vec<RawCandle>>,
    pub iv: Option<Vec<IvPoint>>,
}

#[async_trait]
impl MarketDataProvider for MockMarket {
    async fn fetch_candles(
        &self,
        symbol: &str,
        _resolution: Resolution,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<RawCandle>, MarketError> {
        self.candles
            .clone()
            .ok_or_else(|| MarketError::Network(format!("candles for {} unavailable", symbol)))
    }

    async fn fetch_iv_series(
        &self,
        symbol: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<IvPoint>, MarketError> {
        self.iv
            .clone()
            .ok_or_else(|| MarketError::NotFound(format!("iv series for {}", symbol)))
    }
}

/// 返回固定快照的期权数据源
pub struct MockOptions {
    pub gamma: Option<Vec<Record>>,
    pub oi: Option<Vec<Record>>,
    pub moves: Option<ExpectedMoveSnapshot>,
}

fn unavailable(what: &str) -> MarketError {
    MarketError::Network(format!("{} snapshot unavailable", what))
}

#[async_trait]
impl OptionsSnapshotSource for MockOptions {
    async fn fetch_gamma(&self, _symbol: &str) -> Result<Vec<Record>, MarketError> {
        self.gamma.clone().ok_or_else(|| unavailable("gamma"))
    }

    async fn fetch_open_interest(&self, _symbol: &str) -> Result<Vec<Record>, MarketError> {
        self.oi.clone().ok_or_else(|| unavailable("open interest"))
    }

    async fn fetch_expected_moves(
        &self,
        _symbol: &str,
    ) -> Result<ExpectedMoveSnapshot, MarketError> {
        self.moves.clone().ok_or_else(|| unavailable("expected move"))
    }
}

/// 前 `limit` 次写入成功，之后一律失败的存储
pub struct FlakyStore {
    pub inner: MemSnapshotStore,
    pub limit: usize,
    pub writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: MemSnapshotStore::new(),
            limit,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SnapshotStore for FlakyStore {
    async fn append(&self, snapshot: &KpiSnapshot) -> Result<(), StoreError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.limit {
            return Err(StoreError::Write("disk full".into()));
        }
        self.inner.append(snapshot).await
    }

    async fn latest(&self, symbol: &str, kpi_id: &str) -> Result<Option<KpiSnapshot>, StoreError> {
        self.inner.latest(symbol, kpi_id).await
    }
}
