//! # meridian-analytics
//!
//! 看板 KPI 的计算内核。所有函数都是同步、无状态的纯变换：
//! 输入数据由调用方准备好，输出只依赖输入，可在任意线程并发调用。
//!
//! 历史不足一律返回 `None`，只有回测参数非法时返回 `AnalyticsError`。

pub mod anchor;
pub mod backtest;
pub mod expected_move;
pub mod indicator;
pub mod normalize;
pub mod probe;
pub mod strike;
pub mod vwap;

mod num;
