//! Lead Server - 太阳能线索管理仪表盘聚合后端
//!
//! # 架构概述
//!
//! 本模块是 Lead Server 的主入口，提供以下核心功能：
//!
//! - **角色可见性** (`auth`): JWT 认证 + 按角色推导的数据可见范围
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **指标聚合** (`metrics`): 仪表盘指标、人员表现、趋势与版本化缓存
//! - **变更广播** (`services`): 写路径发布变更事件，驱动缓存失效
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! lead-server/src/
//! ├── core/          # 配置、状态、错误、中间件
//! ├── auth/          # JWT 认证、角色与写权限矩阵
//! ├── services/      # 线索服务、变更广播
//! ├── api/           # HTTP 路由和处理器
//! ├── metrics/       # 指标聚合与缓存
//! ├── routes/        # 路由与中间件组装
//! ├── utils/         # 工具函数
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod metrics;
pub mod routes;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use metrics::MetricsCache;
pub use services::{ChangeFeed, LeadService};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境 (dotenv + 日志)
///
/// 在读取任何配置之前调用，保证 `.env` 内容对 [`Config::from_env`] 可见。
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __                    __
   / /   ___  ____ _____/ /
  / /   / _ \/ __ `/ __  /
 / /___/  __/ /_/ / /_/ /
/_____/\___/\__,_/\__,_/
   _____
  / ___/___  ______   _____  _____
  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ /  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
