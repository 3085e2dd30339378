//! Profile Routes
//!
//! Returns the authenticated caller's own identity claims.

use axum::{Json, Router, routing::get};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok};

/// Build profile router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/profile", get(profile))
}

/// 返回当前登录者的身份信息, 前端据此决定界面可见性
///
/// 服务端授权不依赖这里的返回值, 每个请求都独立校验。
pub async fn profile(current_user: CurrentUser) -> AppResult<Json<AppResponse<CurrentUser>>> {
    Ok(ok(current_user))
}
