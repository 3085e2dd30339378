//! 认证授权模块
//!
//! 提供 JWT 认证、可见性策略和中间件：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`policy`] - 作用域谓词与字段级写权限矩阵
//! - [`require_auth`] - 认证中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod policy;
pub mod role;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{
    CurrentUserExt, require_admin, require_auth, require_dashboard_access,
};
pub use policy::{AttributionField, LeadScope};
pub use role::Role;
