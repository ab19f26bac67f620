use crate::common::Resolution;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub analytics: AnalyticsConfig,
    pub cache: CacheConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

/// # Summary
/// KPI 计算参数。服务层解析后以普通参数传入计算内核，内核本身从不读取配置。
///
/// # Invariants
/// - 所有周期与窗口均以 K 线根数或自然日计。
/// - `strike_window` 为小数比例 (0.05 即 ±5%)。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    // 日历判断使用的参考时区，保证结果与客户端所在地无关
    pub reference_timezone: Tz,
    // K 线周期
    pub resolution: Resolution,
    // 年化天数
    pub annualization_days: f64,
    pub atr_period: usize,
    pub adx_period: usize,
    pub realized_vol_window: usize,
    pub parkinson_window: usize,
    pub pivot_left: usize,
    pub pivot_right: usize,
    // 事件 K 线回看天数
    pub event_lookback_days: i64,
    // 预期波动的目标期限 (天)
    pub expected_move_days: f64,
    pub backtest_horizon_days: usize,
    pub backtest_lookback_days: usize,
    pub strike_window: f64,
    // 拉取 K 线的回看天数
    pub history_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            reference_timezone: chrono_tz::America::New_York,
            resolution: Resolution::Day1,
            annualization_days: 365.0,
            atr_period: 14,
            adx_period: 14,
            realized_vol_window: 20,
            parkinson_window: 20,
            pivot_left: 5,
            pivot_right: 5,
            event_lookback_days: 14,
            expected_move_days: 30.0,
            backtest_horizon_days: 5,
            backtest_lookback_days: 60,
            strike_window: 0.05,
            history_days: 180,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    // 拉取结果的缓存有效期 (秒)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    // 行情与期权快照 JSON 文件所在目录
    pub dir: String,
    // 需要计算 KPI 的标的列表
    pub symbols: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            symbols: vec!["SPY".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    // 为 None 时仅输出到标准输出
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analytics.reference_timezone, chrono_tz::America::New_York);
        assert_eq!(config.analytics.resolution, Resolution::Day1);
        assert_eq!(config.analytics.atr_period, 14);
        assert_eq!(config.analytics.strike_window, 0.05);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.data.dir, "data");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{"analytics": {"reference_timezone": "Europe/Zurich", "resolution": "1h"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.analytics.reference_timezone, chrono_tz::Europe::Zurich);
        assert_eq!(config.analytics.resolution, Resolution::Hour1);
        assert_eq!(config.analytics.adx_period, 14);
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let json = r#"{"analytics": {"reference_timezone": "Mars/Olympus"}}"#;
        assert!(serde_json::from_str::<AppConfig>(json).is_err());
    }
}
