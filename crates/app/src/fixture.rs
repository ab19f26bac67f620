use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::common::Resolution;
use meridian_core::market::entity::{IvPoint, RawCandle};
use meridian_core::market::error::MarketError;
use meridian_core::market::port::MarketDataProvider;
use meridian_core::options::entity::{ExpectedMoveSnapshot, Record};
use meridian_core::options::port::OptionsSnapshotSource;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// # Summary
/// 从本地 JSON 文件读取行情与期权快照的数据源。
///
/// # Invariants
/// - 文件布局为 `<dir>/<symbol>.<kind>.json`，kind 取 candles、iv、gamma、oi、em。
/// - 文件缺失映射为 `MarketError::NotFound`，内容不合法映射为 `MarketError::Parse`。
#[derive(Debug, Clone)]
pub struct JsonFixtureSource {
    dir: PathBuf,
}

impl JsonFixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, symbol: &str, kind: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.json", symbol, kind))
    }

    async fn read<T: DeserializeOwned>(&self, symbol: &str, kind: &str) -> Result<T, MarketError> {
        let path = self.path(symbol, kind);
        debug!("Reading fixture {}", path.display());
        read_json(&path).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MarketError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => MarketError::NotFound(path.display().to_string()),
        _ => MarketError::Unknown(format!("{}: {}", path.display(), e)),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| MarketError::Parse(format!("{}: {}", path.display(), e)))
}

// 毫秒时间戳在 ±2^53 内可被 f64 精确表示
#[allow(clippy::cast_precision_loss)]
fn millis_f64(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64
}

#[async_trait]
impl MarketDataProvider for JsonFixtureSource {
    /// 只保留时间范围内的记录；缺少时间戳的记录原样交给归一化处理
    async fn fetch_candles(
        &self,
        symbol: &str,
        _resolution: Resolution,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawCandle>, MarketError> {
        let rows: Vec<RawCandle> = self.read(symbol, "candles").await?;
        let (lo, hi) = (millis_f64(start), millis_f64(end));
        Ok(rows
            .into_iter()
            .filter(|r| r.timestamp.is_none_or(|t| (lo..=hi).contains(&t)))
            .collect())
    }

    async fn fetch_iv_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<IvPoint>, MarketError> {
        let points: Vec<IvPoint> = self.read(symbol, "iv").await?;
        let (lo, hi) = (start.timestamp_millis(), end.timestamp_millis());
        Ok(points
            .into_iter()
            .filter(|p| (lo..=hi).contains(&p.timestamp))
            .collect())
    }
}

#[async_trait]
impl OptionsSnapshotSource for JsonFixtureSource {
    async fn fetch_gamma(&self, symbol: &str) -> Result<Vec<Record>, MarketError> {
        self.read(symbol, "gamma").await
    }

    async fn fetch_open_interest(&self, symbol: &str) -> Result<Vec<Record>, MarketError> {
        self.read(symbol, "oi").await
    }

    async fn fetch_expected_moves(
        &self,
        symbol: &str,
    ) -> Result<ExpectedMoveSnapshot, MarketError> {
        self.read(symbol, "em").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_fixture_candles_filtered_by_range() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "SPY.candles.json",
            r#"[{"t": 1704110400000, "c": 470.1}, {"t": 1706788800000, "c": 490.5}, {"c": 1}]"#,
        );
        let source = JsonFixtureSource::new(tmp.path());
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let rows = source
            .fetch_candles("SPY", Resolution::Day1, start, end)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].close, Some(490.5));
    }

    #[tokio::test]
    async fn test_fixture_errors() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "SPY.gamma.json", "{not json");
        let source = JsonFixtureSource::new(tmp.path());

        let err = source.fetch_gamma("SPY").await.unwrap_err();
        assert!(matches!(err, MarketError::Parse(_)));
        let err = source.fetch_open_interest("SPY").await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fixture_expected_move_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "QQQ.em.json",
            r#"{"points": [{"days": 30, "emAbs": 12.5}], "state": {"spot": 430.0}}"#,
        );
        let source = JsonFixtureSource::new(tmp.path());
        let snapshot = source.fetch_expected_moves("QQQ").await.unwrap();
        assert_eq!(snapshot.points.len(), 1);
        assert!(snapshot.state.is_some());
    }
}
