//! # meridian-core
//!
//! 行情看板分析系统的领域内核：实体、错误、配置以及外部协作方的端口 (Port) 定义。
//! 本 crate 不包含任何计算逻辑，计算逻辑位于 `meridian-analytics`。

pub mod analytics;
pub mod cache;
pub mod common;
pub mod config;
pub mod market;
pub mod options;
pub mod store;
