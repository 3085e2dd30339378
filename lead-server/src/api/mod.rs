//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`profile`] - 当前用户身份
//! - [`leads`] - 线索管理接口
//! - [`metrics`] - 指标聚合接口
//! - [`expenses`] - 营销支出接口
//! - [`users`] - 账号管理接口

pub mod health;
pub mod profile;

// Data models API
pub mod expenses;
pub mod leads;
pub mod metrics;
pub mod users;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
