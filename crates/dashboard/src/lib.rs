//! # meridian-dashboard
//!
//! 应用服务层：通过端口拉取输入，调用计算内核，组装 KPI 快照并交给存储端口。

pub mod error;
pub mod kpi;
pub mod service;
pub mod store;
