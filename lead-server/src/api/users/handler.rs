//! User Account API Handlers
//!
//! 账号管理仅管理员可用。凭证与登录由外部身份服务负责，
//! 这里只维护角色、归属和激活状态。

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserAccount, UserCreate, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_email, validate_required_text};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// GET /api/users - 全部账号 (含停用)
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<UserAccount>>>> {
    let repo = UserRepository::new(state.db.clone());
    let users = repo.find_all().await?;
    Ok(ok(users))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<UserAccount>>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;
    Ok(ok(user))
}

/// POST /api/users - 创建账号
///
/// field_rep 必须携带非空 account_manager_name，其他角色必须不带，
/// 归属不变量在 repository 层校验。
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<AppResponse<UserAccount>>> {
    validate_email(&payload.email)?;
    validate_required_text(&payload.full_name, "full_name", MAX_NAME_LEN)?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.create(payload).await?;
    Ok(ok(user))
}

/// PATCH /api/users/{id} - 部分更新
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<AppResponse<UserAccount>>> {
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref full_name) = payload.full_name {
        validate_required_text(full_name, "full_name", MAX_NAME_LEN)?;
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update(&id, payload).await?;
    Ok(ok(user))
}

/// DELETE /api/users/{id} - 停用账号 (软删除)
pub async fn deactivate(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<UserAccount>>> {
    // 管理员不能停用自己的账号
    if current_user.id == id {
        return Err(AppError::validation("Cannot deactivate your own account"));
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.deactivate(&id).await?;
    Ok(ok(user))
}
