//! Lead API Module

mod handler;

use axum::{Router, routing::get, routing::patch};

use crate::core::ServerState;

/// Lead router
///
/// 角色门禁 (创建/删除) 和字段级写权限在服务层执行，
/// 这里只挂认证后的路由。
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/leads", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/survey-status", patch(handler::update_survey_status))
}
