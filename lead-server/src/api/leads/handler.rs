//! Lead API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Lead, LeadCreate, LeadStatus, LeadUpdate, SurveyStatus};
use crate::db::repository::{LeadFilters, LeadPage, LeadSort, SortColumn, SortDirection};
use crate::utils::time;
use crate::utils::{AppError, AppResponse, AppResult, ok};

// ============================================================================
// Query Parameters
// ============================================================================

/// 列表查询参数，全部可选
///
/// 过滤器只能收窄调用方作用域内的集合，作用域本身由服务端推导。
#[derive(Debug, Default, Deserialize)]
pub struct LeadListQuery {
    /// 跨 name/email/tel/postcode 的大小写不敏感搜索
    pub search: Option<String>,
    /// 状态过滤 (wire 字符串，如 "New Lead")
    pub status: Option<String>,
    /// 勘测状态过滤 (wire 字符串，如 "Good Survey")
    pub survey_status: Option<String>,
    pub account_manager: Option<String>,
    pub field_rep: Option<String>,
    pub postcode: Option<String>,
    /// 创建时间下界 (RFC 3339)
    pub created_from: Option<String>,
    /// 创建时间上界 (RFC 3339)
    pub created_to: Option<String>,
    /// 排序列 (allow-list: customer_name | postcode | status | created_at)
    pub sort_by: Option<String>,
    /// 排序方向 (asc | desc)
    pub sort_dir: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    25
}

impl LeadListQuery {
    /// 解析 wire 字符串参数；非法值一律 400，不静默忽略
    fn into_parts(self) -> AppResult<(LeadFilters, LeadSort, LeadPage)> {
        let status = self
            .status
            .as_deref()
            .map(LeadStatus::from_str)
            .transpose()
            .map_err(AppError::validation)?;
        let survey_status = self
            .survey_status
            .as_deref()
            .map(SurveyStatus::from_str)
            .transpose()
            .map_err(AppError::validation)?;
        let created_from = self
            .created_from
            .as_deref()
            .map(time::parse_instant)
            .transpose()?;
        let created_to = self
            .created_to
            .as_deref()
            .map(time::parse_instant)
            .transpose()?;

        let filters = LeadFilters {
            search_text: self.search,
            status,
            survey_status,
            account_manager: self.account_manager,
            field_rep: self.field_rep,
            postcode: self.postcode,
            created_from,
            created_to,
        };

        let sort = LeadSort {
            column: self
                .sort_by
                .as_deref()
                .map(SortColumn::from_str)
                .transpose()
                .map_err(AppError::validation)?
                .unwrap_or_default(),
            direction: self
                .sort_dir
                .as_deref()
                .map(SortDirection::from_str)
                .transpose()
                .map_err(AppError::validation)?
                .unwrap_or_default(),
        };

        let page = LeadPage {
            page: self.page,
            page_size: self.page_size,
        };

        Ok((filters, sort, page))
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// 分页列表响应
#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub items: Vec<Lead>,
    /// 作用域 + 过滤后、分页前的总数
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Survey status PATCH body
#[derive(Debug, Deserialize)]
pub struct SurveyStatusUpdate {
    pub survey_status: SurveyStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/leads - 作用域内的分页列表
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<LeadListQuery>,
) -> AppResult<Json<AppResponse<LeadListResponse>>> {
    let (filters, sort, page) = query.into_parts()?;
    let service = state.lead_service();
    let (items, total) = service.list(&current_user, &filters, sort, page).await?;

    let total_pages = total.div_ceil(page.page_size);
    Ok(ok(LeadListResponse {
        items,
        total,
        page: page.page,
        page_size: page.page_size,
        total_pages,
    }))
}

/// GET /api/leads/{id} - 单条读取 (作用域外与不存在同样 404)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Lead>>> {
    let service = state.lead_service();
    let lead = service.get(&current_user, &id).await?;
    Ok(ok(lead))
}

/// POST /api/leads - 创建 (admin / account manager)
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<LeadCreate>,
) -> AppResult<Json<AppResponse<Lead>>> {
    let service = state.lead_service();
    let lead = service.create(&current_user, payload).await?;
    Ok(ok(lead))
}

/// PATCH /api/leads/{id} - 部分更新 (整体接受或整体拒绝)
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<LeadUpdate>,
) -> AppResult<Json<AppResponse<Lead>>> {
    let service = state.lead_service();
    let lead = service.update(&current_user, &id, payload).await?;
    Ok(ok(lead))
}

/// PATCH /api/leads/{id}/survey-status - 勘测结果快捷更新
///
/// 与普通更新走同一套写权限矩阵。
pub async fn update_survey_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<SurveyStatusUpdate>,
) -> AppResult<Json<AppResponse<Lead>>> {
    let service = state.lead_service();
    let lead = service
        .update_survey_status(&current_user, &id, payload.survey_status)
        .await?;
    Ok(ok(lead))
}

/// DELETE /api/leads/{id} - 删除 (admin / account manager，作用域内)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    let service = state.lead_service();
    let deleted = service.delete(&current_user, &id).await?;
    Ok(ok(deleted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_first_page_newest_first() {
        let query = LeadListQuery::default();
        // serde defaults only apply on deserialization, emulate them here
        let query = LeadListQuery {
            page: default_page(),
            page_size: default_page_size(),
            ..query
        };
        let (filters, sort, page) = query.into_parts().expect("defaults parse");
        assert!(filters.search_text.is_none());
        assert_eq!(sort.column, SortColumn::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 25);
    }

    #[test]
    fn query_rejects_unknown_sort_column() {
        let query = LeadListQuery {
            sort_by: Some("lead_cost".to_string()),
            page: 1,
            page_size: 25,
            ..LeadListQuery::default()
        };
        assert!(query.into_parts().is_err());
    }

    #[test]
    fn query_rejects_bad_status_string() {
        let query = LeadListQuery {
            status: Some("new lead".to_string()),
            page: 1,
            page_size: 25,
            ..LeadListQuery::default()
        };
        assert!(query.into_parts().is_err());
    }

    #[test]
    fn query_parses_wire_strings() {
        let query = LeadListQuery {
            status: Some("Survey Booked".to_string()),
            survey_status: Some("Good Survey".to_string()),
            created_from: Some("2025-03-01T00:00:00Z".to_string()),
            created_to: Some("2025-03-31T23:59:59Z".to_string()),
            sort_by: Some("postcode".to_string()),
            sort_dir: Some("asc".to_string()),
            page: 2,
            page_size: 50,
            ..LeadListQuery::default()
        };
        let (filters, sort, page) = query.into_parts().expect("valid query");
        assert_eq!(filters.status, Some(LeadStatus::SurveyBooked));
        assert_eq!(filters.survey_status, Some(SurveyStatus::Good));
        assert!(filters.created_from.unwrap() < filters.created_to.unwrap());
        assert_eq!(sort.column, SortColumn::Postcode);
        assert_eq!(sort.direction, SortDirection::Asc);
        assert_eq!(page.offset(), 50);
    }
}
