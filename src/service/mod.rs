// src/service/mod.rs
// 模拟设备服务：数据生成、缓冲、统计导出、轮询
pub mod buffer;
pub mod connection;
pub mod data_service;
pub mod error;
pub mod generator;
pub mod polling;
pub mod stats;
// 公开导出常用类型
pub use buffer::DEFAULT_CAPACITY;
pub use data_service::DataService;
pub use error::DashboardError;
pub use polling::{lock_service, shared, PollingController, DEFAULT_POLL_INTERVAL};
