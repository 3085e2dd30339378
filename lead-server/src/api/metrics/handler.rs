//! Metrics API Handlers
//!
//! 读路径：作用域 → 缓存键 → 版本校验命中则直接返回，
//! 未命中取快照重算并写回。聚合器总是完整计算，
//! 角色相关的字段收窄只发生在这里的响应整形。

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::{CurrentUser, LeadScope, policy};
use crate::core::ServerState;
use crate::db::repository::{ExpenseRepository, LeadRepository};
use crate::metrics::{
    DashboardMetrics, StaffGrouping, StaffPerformanceRow, TrendPoint, compute_dashboard_metrics,
    compute_lead_trend, compute_staff_performance, range_key,
};
use crate::utils::time::DateRange;
use crate::utils::{AppError, AppResponse, AppResult, ok};

// ============================================================================
// Query Parameters
// ============================================================================

/// 聚合区间，RFC 3339 瞬时值
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

impl RangeQuery {
    fn parse(&self) -> AppResult<DateRange> {
        DateRange::parse(&self.from, &self.to)
    }
}

#[derive(Debug, Deserialize)]
pub struct StaffQuery {
    pub from: String,
    pub to: String,
    /// 可选分组参数，只接受部署配置的维度
    pub group_by: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Dashboard 响应
///
/// 与 [`DashboardMetrics`] 字段一致，但 CPL 拆分是可缺省字段：
/// account manager 的响应不携带它们，其余角色总是携带。
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_leads: usize,
    pub surveys_booked: usize,
    pub pending_surveys: usize,
    pub good_surveys: usize,
    pub bad_surveys: usize,
    pub sold_surveys: usize,
    pub conversion_leads_to_surveys: f64,
    pub conversion_leads_to_sold: f64,
    pub online_leads: usize,
    pub field_leads: usize,
    pub total_online_expenses: f64,
    pub total_field_expenses: f64,
    pub total_expenses: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_lead_online: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_lead_field: Option<f64>,
    pub cost_per_lead: f64,
    pub total_lead_cost: f64,
}

impl DashboardResponse {
    /// 响应整形：聚合结果 + 角色 → 响应
    fn shape(metrics: DashboardMetrics, show_cost_split: bool) -> Self {
        let (cost_per_lead_online, cost_per_lead_field) = if show_cost_split {
            (
                Some(metrics.cost_per_lead_online),
                Some(metrics.cost_per_lead_field),
            )
        } else {
            (None, None)
        };

        Self {
            total_leads: metrics.total_leads,
            surveys_booked: metrics.surveys_booked,
            pending_surveys: metrics.pending_surveys,
            good_surveys: metrics.good_surveys,
            bad_surveys: metrics.bad_surveys,
            sold_surveys: metrics.sold_surveys,
            conversion_leads_to_surveys: metrics.conversion_leads_to_surveys,
            conversion_leads_to_sold: metrics.conversion_leads_to_sold,
            online_leads: metrics.online_leads,
            field_leads: metrics.field_leads,
            total_online_expenses: metrics.total_online_expenses,
            total_field_expenses: metrics.total_field_expenses,
            total_expenses: metrics.total_expenses,
            cost_per_lead_online,
            cost_per_lead_field,
            cost_per_lead: metrics.cost_per_lead,
            total_lead_cost: metrics.total_lead_cost,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/metrics/dashboard?from=&to=
pub async fn dashboard(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<AppResponse<DashboardResponse>>> {
    let range = query.parse()?;
    let scope = LeadScope::for_user(&current_user);
    let key = range_key(&scope, range);
    let versions = state.change_feed.current_versions();

    let metrics = match state.metrics_cache.get_dashboard(&key, versions) {
        Some(cached) => cached,
        None => {
            let leads = LeadRepository::new(state.db.clone())
                .metric_snapshots(&scope, range)
                .await?;
            let expenses = ExpenseRepository::new(state.db.clone())
                .amount_snapshots(&range.from_day(), &range.to_day())
                .await?;
            let computed = compute_dashboard_metrics(&leads, &expenses);
            state
                .metrics_cache
                .put_dashboard(key, versions, computed.clone());
            computed
        }
    };

    let show_cost_split = policy::shows_cost_split(current_user.role);
    Ok(ok(DashboardResponse::shape(metrics, show_cost_split)))
}

/// GET /api/metrics/staff?from=&to=[&group_by=]
pub async fn staff(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<StaffQuery>,
) -> AppResult<Json<AppResponse<Vec<StaffPerformanceRow>>>> {
    let range = DateRange::parse(&query.from, &query.to)?;
    let grouping = resolve_grouping(query.group_by.as_deref(), state.config.staff_grouping)?;

    let scope = LeadScope::for_user(&current_user);
    let key = format!("{}|{}", grouping.as_str(), range_key(&scope, range));
    let lead_version = state.change_feed.lead_version();

    if let Some(rows) = state.metrics_cache.get_staff(&key, lead_version) {
        return Ok(ok(rows));
    }

    let leads = LeadRepository::new(state.db.clone())
        .metric_snapshots(&scope, range)
        .await?;
    let rows = compute_staff_performance(&leads, grouping);
    state
        .metrics_cache
        .put_staff(key, lead_version, rows.clone());
    Ok(ok(rows))
}

/// GET /api/metrics/trend?from=&to=
pub async fn trend(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<AppResponse<Vec<TrendPoint>>>> {
    let range = query.parse()?;
    let scope = LeadScope::for_user(&current_user);
    let key = range_key(&scope, range);
    let lead_version = state.change_feed.lead_version();

    if let Some(points) = state.metrics_cache.get_trend(&key, lead_version) {
        return Ok(ok(points));
    }

    let leads = LeadRepository::new(state.db.clone())
        .metric_snapshots(&scope, range)
        .await?;
    let points = compute_lead_trend(&leads, range);
    state
        .metrics_cache
        .put_trend(key, lead_version, points.clone());
    Ok(ok(points))
}

/// 调用方的 group_by 只能等于部署配置的维度，不能放宽
fn resolve_grouping(
    requested: Option<&str>,
    configured: StaffGrouping,
) -> AppResult<StaffGrouping> {
    match requested {
        None => Ok(configured),
        Some(raw) => {
            let parsed = StaffGrouping::from_str(raw).map_err(AppError::validation)?;
            if parsed != configured {
                return Err(AppError::validation(format!(
                    "group_by {} is not enabled for this deployment",
                    parsed.as_str()
                )));
            }
            Ok(parsed)
        }
    }
}
