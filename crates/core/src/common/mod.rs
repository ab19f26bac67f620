pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// K 线周期枚举，定义单根 K 线覆盖的时间跨度。
///
/// # Invariants
/// - 按 24 小时连续交易折算每日 K 线数量，周线按 1/7 根每日计算。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    // 1分钟
    Minute1,
    // 5分钟
    Minute5,
    // 15分钟
    Minute15,
    // 30分钟
    Minute30,
    // 1小时
    Hour1,
    // 4小时
    Hour4,
    // 1日
    #[default]
    Day1,
    // 1周
    Week1,
}

impl Resolution {
    /// # Summary
    /// 单根 K 线对应的分钟数。
    pub fn minutes(&self) -> u32 {
        match self {
            Resolution::Minute1 => 1,
            Resolution::Minute5 => 5,
            Resolution::Minute15 => 15,
            Resolution::Minute30 => 30,
            Resolution::Hour1 => 60,
            Resolution::Hour4 => 240,
            Resolution::Day1 => 1_440,
            Resolution::Week1 => 10_080,
        }
    }

    /// # Summary
    /// 每个自然日包含的 K 线数量。
    ///
    /// # Logic
    /// 1440 分钟除以单根 K 线分钟数，周线结果为 1/7。
    pub fn bars_per_day(&self) -> f64 {
        1_440.0 / f64::from(self.minutes())
    }

    /// # Summary
    /// 年化系数：`annualization_days × bars_per_day`。
    ///
    /// # Arguments
    /// * `annualization_days`: 每年计入的天数 (例如 365 或 252)。
    ///
    /// # Returns
    /// 每年的 K 线根数。
    pub fn periods_per_year(&self, annualization_days: f64) -> f64 {
        annualization_days * self.bars_per_day()
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "minute1" => Ok(Resolution::Minute1),
            "5m" | "minute5" => Ok(Resolution::Minute5),
            "15m" | "minute15" => Ok(Resolution::Minute15),
            "30m" | "minute30" => Ok(Resolution::Minute30),
            "1h" | "60m" | "hour1" => Ok(Resolution::Hour1),
            "4h" | "240m" | "hour4" => Ok(Resolution::Hour4),
            "1d" | "d" | "day1" => Ok(Resolution::Day1),
            "1w" | "w" | "week1" => Ok(Resolution::Week1),
            _ => Err(format!("Unknown Resolution: {}", s)),
        }
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Minute1 => write!(f, "1m"),
            Resolution::Minute5 => write!(f, "5m"),
            Resolution::Minute15 => write!(f, "15m"),
            Resolution::Minute30 => write!(f, "30m"),
            Resolution::Hour1 => write!(f, "1h"),
            Resolution::Hour4 => write!(f, "4h"),
            Resolution::Day1 => write!(f, "1d"),
            Resolution::Week1 => write!(f, "1w"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse_and_display() {
        assert_eq!("1D".parse::<Resolution>().unwrap(), Resolution::Day1);
        assert_eq!("240m".parse::<Resolution>().unwrap(), Resolution::Hour4);
        assert!("3d".parse::<Resolution>().is_err());
        assert_eq!(Resolution::Minute15.to_string(), "15m");
    }

    #[test]
    fn test_bars_per_day() {
        assert_eq!(Resolution::Day1.bars_per_day(), 1.0);
        assert_eq!(Resolution::Hour1.bars_per_day(), 24.0);
        assert!((Resolution::Week1.bars_per_day() - 1.0 / 7.0).abs() < 1e-12);
        assert_eq!(Resolution::Day1.periods_per_year(365.0), 365.0);
    }
}
