//! 趋势与波动率指标引擎。
//!
//! - `trend`：Wilder 真实波幅、ATR、DI/DX/ADX。
//! - `volatility`：收盘价对数收益波动率、Parkinson 高低价波动率。

pub mod trend;
pub mod volatility;

pub use trend::{AdxPhase, AdxSmoother, WilderSum, directional_movement, true_range, wilder_atr};
pub use volatility::{parkinson_volatility, realized_volatility};
