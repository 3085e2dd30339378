//! Metrics API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_dashboard_access;
use crate::core::ServerState;

/// Metrics router
///
/// 所有聚合视图在路由层整体拒绝 installer，处理器内不再分支角色。
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/metrics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/dashboard", get(handler::dashboard))
        .route("/staff", get(handler::staff))
        .route("/trend", get(handler::trend))
        .layer(middleware::from_fn(require_dashboard_access))
}
