//! User Account Management API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// 账号管理路由, 整组仅限管理员
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            patch(handler::update)
                .get(handler::get_by_id)
                .delete(handler::deactivate),
        )
        .layer(middleware::from_fn(require_admin))
}
