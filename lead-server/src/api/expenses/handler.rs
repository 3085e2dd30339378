//! Expense API Handlers
//!
//! 支出不做角色作用域，但整个接口仅管理员可用 (路由层门禁)。

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::str::FromStr;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Expense, ExpenseCategory, ExpenseCreate};
use crate::db::repository::ExpenseRepository;
use crate::metrics::validate_expense_split;
use crate::services::{COLLECTION_EXPENSE, ChangeAction};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResponse, AppResult, ok, time};

/// 列表查询参数，业务日期为 "YYYY-MM-DD"
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    /// wire 名称，如 "Marketing"
    pub category: Option<String>,
}

/// GET /api/expenses - 日期与类别过滤，最新业务日在前
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> AppResult<Json<AppResponse<Vec<Expense>>>> {
    let repo = ExpenseRepository::new(state.db.clone());

    let category = query
        .category
        .as_deref()
        .map(ExpenseCategory::from_str)
        .transpose()
        .map_err(AppError::validation)?;

    let expenses = match (query.from, query.to) {
        (None, None) if category.is_none() => repo.find_all().await?,
        (from, to) => {
            // 缺省的一侧用极值补齐，字典序比较下仍然正确
            let from_day = match from {
                Some(day) => {
                    time::parse_date(&day)?;
                    day
                }
                None => "0000-01-01".to_string(),
            };
            let to_day = match to {
                Some(day) => {
                    time::parse_date(&day)?;
                    day
                }
                None => "9999-12-31".to_string(),
            };
            if from_day > to_day {
                return Err(AppError::validation(format!(
                    "Invalid date range: from ({}) is after to ({})",
                    from_day, to_day
                )));
            }
            repo.find_in_range(&from_day, &to_day, category).await?
        }
    };

    Ok(ok(expenses))
}

/// POST /api/expenses - 创建，拆分金额必须对账
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<ExpenseCreate>,
) -> AppResult<Json<AppResponse<Expense>>> {
    time::parse_date(&payload.expense_date)?;
    validate_required_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;
    validate_expense_split(
        payload.total_amount,
        payload.online_amount,
        payload.field_amount,
    )
    .map_err(AppError::validation)?;

    let repo = ExpenseRepository::new(state.db.clone());
    let expense = repo.create(payload, current_user.full_name.clone()).await?;

    let id = expense.id.as_ref().map(|id| id.to_string());
    state.change_feed.publish(
        COLLECTION_EXPENSE,
        ChangeAction::Created,
        id.as_deref(),
        Some(&expense),
    );

    Ok(ok(expense))
}
