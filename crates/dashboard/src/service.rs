use chrono::{DateTime, Duration, Utc};
use meridian_analytics::anchor::{event_anchor, month_open_anchor, swing_pivot};
use meridian_analytics::backtest::{BacktestParams, hit_rate, merge_daily, time_to_first_breach};
use meridian_analytics::expected_move::pick_expected_move;
use meridian_analytics::indicator::{directional_movement, parkinson_volatility, realized_volatility};
use meridian_analytics::normalize::normalize;
use meridian_analytics::probe::{self, strike_records};
use meridian_analytics::strike::build_strike_map;
use meridian_analytics::vwap::{VwapWeighting, anchored_vwap, percent_distance, session_vwap};
use meridian_core::common::time::TimeProvider;
use meridian_core::config::AnalyticsConfig;
use meridian_core::market::entity::{Anchor, Candle, IvPoint};
use meridian_core::market::error::MarketError;
use meridian_core::market::port::MarketDataProvider;
use meridian_core::options::port::OptionsSnapshotSource;
use meridian_core::store::entity::KpiSnapshot;
use meridian_core::store::port::SnapshotStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DashboardError;
use crate::kpi::{
    AdxKpi, AtrKpi, BreachKpi, HitRateKpi, KpiId, KpiReport, VolatilityKpi, VwapKpi,
};

/// VWAP 统一采用成交量优先、缺失时等权的策略
const WEIGHTING: VwapWeighting = VwapWeighting::VolumeOrEqual;

/// # Summary
/// KPI 组装服务，系统的应用服务层门面 (Facade)。
/// 编译期仅依赖 `meridian-core` 中的端口定义，所有具体实现通过构造函数注入。
///
/// # Invariants
/// - 计算内核只接收解析完成的普通参数，“当前时刻”一律来自 `clock`。
/// - K 线拉取失败使整次运行失败；期权数据或隐含波动率拉取失败只降级相关 KPI。
pub struct KpiService {
    // 行情数据端口
    market: Arc<dyn MarketDataProvider>,
    // 期权快照端口
    options: Arc<dyn OptionsSnapshotSource>,
    // 快照持久化端口
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn TimeProvider>,
    config: AnalyticsConfig,
}

/// 单次运行内逐条收集的 KPI 负载
struct Collected {
    run_id: String,
    symbol: String,
    computed_at: DateTime<Utc>,
    snapshots: Vec<KpiSnapshot>,
    degraded: Vec<KpiId>,
}

impl Collected {
    fn push<T: Serialize>(&mut self, id: KpiId, payload: &T) -> Result<(), DashboardError> {
        let payload =
            serde_json::to_value(payload).map_err(|e| DashboardError::Serialize(e.to_string()))?;
        self.snapshots.push(KpiSnapshot {
            run_id: self.run_id.clone(),
            kpi_id: id.as_str().to_string(),
            symbol: self.symbol.clone(),
            computed_at: self.computed_at,
            payload,
        });
        Ok(())
    }

    fn degrade(&mut self, ids: &[KpiId], reason: &MarketError) {
        for id in ids {
            warn!("KPI {} for {} degraded: {}", id, self.symbol, reason);
            self.degraded.push(*id);
        }
    }
}

impl KpiService {
    /// # Summary
    /// 创建 KpiService 实例。
    ///
    /// # Arguments
    /// * `market` - 行情数据端口的具体实现。
    /// * `options` - 期权快照端口的具体实现。
    /// * `store` - 快照存储端口的具体实现。
    /// * `clock` - 时间供给器。
    /// * `config` - 解析完成的 KPI 参数。
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        options: Arc<dyn OptionsSnapshotSource>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn TimeProvider>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            market,
            options,
            store,
            clock,
            config,
        }
    }

    /// # Summary
    /// 对单个标的执行一次完整的 KPI 计算。
    ///
    /// # Logic
    /// 1. 生成运行 ID，从时钟取得当前时刻。
    /// 2. 拉取并归一化 K 线，计算趋势、波动率与 VWAP 类 KPI。
    /// 3. 拉取隐含波动率序列执行预期波动回测。
    /// 4. 并发拉取 Gamma、OI 与预期波动快照，计算预期波动与行权价分布。
    /// 5. 所有快照按顺序追加到存储。写入不是原子的：中途失败时已写入的快照保留，
    ///    错误中带有运行 ID 与已写入条数。
    ///
    /// # Arguments
    /// * `symbol` - 证券代码。
    ///
    /// # Returns
    /// * `Result<KpiReport, DashboardError>` - K 线拉取失败、历史窗口越界、回测参数非法或存储写入失败时返回错误。
    pub async fn run(&self, symbol: &str) -> Result<KpiReport, DashboardError> {
        let now = self.clock.now();
        let start = Duration::try_days(self.config.history_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or(DashboardError::HistoryWindow(self.config.history_days))?;
        let mut collected = Collected {
            run_id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            computed_at: now,
            snapshots: Vec::new(),
            degraded: Vec::new(),
        };
        info!("KPI run {} started for {}", collected.run_id, symbol);

        let raw = self
            .market
            .fetch_candles(symbol, self.config.resolution, start, now)
            .await?;
        let candles = normalize(&raw);
        debug!(
            "Normalized {} of {} raw candles for {}",
            candles.len(),
            raw.len(),
            symbol
        );
        let last_close = candles.last().map(|c| c.close);

        self.candle_kpis(&candles, now, &mut collected)?;

        match self.market.fetch_iv_series(symbol, start, now).await {
            Ok(iv) => self.backtest_kpis(&candles, &iv, &mut collected)?,
            Err(e) => collected.degrade(&[KpiId::EmHitRate, KpiId::EmBreachTiming], &e),
        }

        self.option_kpis(symbol, last_close, &mut collected).await?;

        let total = collected.snapshots.len();
        for (appended, snapshot) in collected.snapshots.iter().enumerate() {
            if let Err(source) = self.store.append(snapshot).await {
                warn!(
                    "KPI run {} persisted {} of {} snapshots before failing",
                    collected.run_id, appended, total
                );
                return Err(DashboardError::Persist {
                    run_id: collected.run_id,
                    appended,
                    total,
                    source,
                });
            }
        }
        info!(
            "KPI run {} finished for {}: {} snapshots, {} degraded",
            collected.run_id,
            symbol,
            collected.snapshots.len(),
            collected.degraded.len()
        );

        Ok(KpiReport {
            run_id: collected.run_id,
            symbol: collected.symbol,
            computed_at: now,
            candles: candles.len(),
            last_close,
            snapshots: collected.snapshots,
            degraded: collected.degraded,
        })
    }

    fn candle_kpis(
        &self,
        candles: &[Candle],
        now: DateTime<Utc>,
        out: &mut Collected,
    ) -> Result<(), DashboardError> {
        let cfg = &self.config;
        let ppy = cfg.resolution.periods_per_year(cfg.annualization_days);

        let atr_points = directional_movement(candles, cfg.atr_period);
        out.push(
            KpiId::Atr,
            &AtrKpi {
                period: cfg.atr_period,
                value: atr_points.last().and_then(|p| p.atr),
            },
        )?;

        let adx_points = if cfg.adx_period == cfg.atr_period {
            atr_points
        } else {
            directional_movement(candles, cfg.adx_period)
        };
        let last = adx_points.last().copied().unwrap_or_default();
        out.push(
            KpiId::Adx,
            &AdxKpi {
                period: cfg.adx_period,
                adx: last.adx,
                di_plus: last.di_plus,
                di_minus: last.di_minus,
            },
        )?;

        out.push(
            KpiId::RealizedVol,
            &VolatilityKpi {
                window: cfg.realized_vol_window,
                periods_per_year: ppy,
                value: realized_volatility(candles, cfg.realized_vol_window, ppy),
            },
        )?;
        out.push(
            KpiId::ParkinsonVol,
            &VolatilityKpi {
                window: cfg.parkinson_window,
                periods_per_year: ppy,
                value: parkinson_volatility(candles, cfg.parkinson_window, ppy),
            },
        )?;

        let last_close = candles.last().map(|c| c.close);
        let session = session_vwap(candles, now, cfg.reference_timezone, WEIGHTING);
        out.push(
            KpiId::SessionVwap,
            &VwapKpi {
                anchor: None,
                vwap: session,
                distance: distance(last_close, session.map(|v| v.value)),
            },
        )?;

        let anchors = [
            (
                KpiId::AvwapSwing,
                swing_pivot(candles, cfg.pivot_left, cfg.pivot_right, None),
            ),
            (
                KpiId::AvwapMonth,
                month_open_anchor(candles, now, cfg.reference_timezone),
            ),
            (
                KpiId::AvwapEvent,
                event_anchor(candles, cfg.event_lookback_days),
            ),
        ];
        for (id, anchor) in anchors {
            out.push(id, &anchored(candles, anchor, last_close))?;
        }
        Ok(())
    }

    fn backtest_kpis(
        &self,
        candles: &[Candle],
        iv: &[IvPoint],
        out: &mut Collected,
    ) -> Result<(), DashboardError> {
        let params = BacktestParams {
            horizon_days: self.config.backtest_horizon_days,
            lookback_days: self.config.backtest_lookback_days,
        };
        let series = merge_daily(candles, iv, self.config.reference_timezone);
        let hits = hit_rate(&series, params)?;
        let breach = time_to_first_breach(&series, params)?;
        out.push(
            KpiId::EmHitRate,
            &HitRateKpi {
                horizon_days: params.horizon_days,
                lookback_days: params.lookback_days,
                stats: hits,
            },
        )?;
        out.push(
            KpiId::EmBreachTiming,
            &BreachKpi {
                horizon_days: params.horizon_days,
                lookback_days: params.lookback_days,
                stats: breach,
            },
        )
    }

    async fn option_kpis(
        &self,
        symbol: &str,
        spot: Option<f64>,
        out: &mut Collected,
    ) -> Result<(), DashboardError> {
        let (moves, gamma, oi) = tokio::join!(
            self.options.fetch_expected_moves(symbol),
            self.options.fetch_gamma(symbol),
            self.options.fetch_open_interest(symbol),
        );

        match moves {
            Ok(snapshot) => {
                let pick = pick_expected_move(&snapshot, self.config.expected_move_days, spot);
                out.push(KpiId::ExpectedMove, &pick)?;
            }
            Err(e) => out.degrade(&[KpiId::ExpectedMove], &e),
        }

        match (gamma, oi) {
            (Ok(gamma), Ok(oi)) => {
                let gamma = strike_records(&gamma, &probe::GAMMA);
                let oi = strike_records(&oi, &probe::OPEN_INTEREST);
                let state = build_strike_map(&gamma, &oi, spot, self.config.strike_window);
                out.push(KpiId::StrikeMap, &state)?;
            }
            (Err(e), _) | (_, Err(e)) => out.degrade(&[KpiId::StrikeMap], &e),
        }
        Ok(())
    }
}

fn distance(spot: Option<f64>, reference: Option<f64>) -> Option<f64> {
    percent_distance(spot?, reference?)
}

fn anchored(candles: &[Candle], anchor: Option<Anchor>, last_close: Option<f64>) -> VwapKpi {
    let vwap = anchor.and_then(|a| anchored_vwap(candles, a.index, WEIGHTING));
    VwapKpi {
        anchor,
        vwap,
        distance: distance(last_close, vwap.map(|v| v.value)),
    }
}
