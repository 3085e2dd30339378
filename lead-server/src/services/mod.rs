//! 业务服务层
//!
//! - [`LeadService`] - lead 查询与变更流程 (作用域 + 写权限矩阵)
//! - [`ChangeFeed`] - 资源版本号与变更广播

pub mod change_feed;
pub mod lead_service;

pub use change_feed::{
    COLLECTION_EXPENSE, COLLECTION_LEAD, ChangeAction, ChangeEvent, ChangeFeed,
    run_invalidation_listener,
};
pub use lead_service::LeadService;
