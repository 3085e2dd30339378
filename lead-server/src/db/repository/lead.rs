//! Lead Repository
//!
//! 所有查询都必须带 [`LeadScope`]，作用域条件永远拼在 WHERE 首位，
//! 调用方的过滤参数只能收窄可见集，不能放宽。

use super::{BaseRepository, RepoError, RepoResult};
use crate::auth::LeadScope;
use crate::db::models::{Lead, LeadCreate, LeadSnapshot, LeadStatus, LeadUpdate, SurveyStatus};
use crate::utils::time::{self, DateRange};
use std::str::FromStr;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::RecordId;

const TABLE: &str = "lead";

/// Page sizes accepted by the list endpoint
pub const ALLOWED_PAGE_SIZES: &[usize] = &[25, 50, 100];

/// Sortable columns, fixed allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    CustomerName,
    Postcode,
    Status,
    #[default]
    CreatedAt,
}

impl SortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::CustomerName => "customer_name",
            SortColumn::Postcode => "postcode",
            SortColumn::Status => "status",
            SortColumn::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer_name" => Ok(SortColumn::CustomerName),
            "postcode" => Ok(SortColumn::Postcode),
            "status" => Ok(SortColumn::Status),
            "created_at" => Ok(SortColumn::CreatedAt),
            _ => Err(format!("unknown sort column: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("unknown sort direction: {}", s)),
        }
    }
}

/// Sort order, defaults to newest first
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadSort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Optional caller filters, each an additional AND condition
#[derive(Debug, Clone, Default)]
pub struct LeadFilters {
    /// Case-insensitive match across name, email, phone and postcode
    pub search_text: Option<String>,
    pub status: Option<LeadStatus>,
    pub survey_status: Option<SurveyStatus>,
    pub account_manager: Option<String>,
    pub field_rep: Option<String>,
    pub postcode: Option<String>,
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
}

/// 1-based page request
#[derive(Debug, Clone, Copy)]
pub struct LeadPage {
    pub page: usize,
    pub page_size: usize,
}

impl LeadPage {
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }
}

impl Default for LeadPage {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 25,
        }
    }
}

#[derive(Clone)]
pub struct LeadRepository {
    base: BaseRepository,
}

impl LeadRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List leads visible to the scope, filtered, sorted and paginated.
    /// Returns the page of rows plus the total count before pagination.
    pub async fn list(
        &self,
        scope: &LeadScope,
        filters: &LeadFilters,
        sort: LeadSort,
        page: LeadPage,
    ) -> RepoResult<(Vec<Lead>, usize)> {
        let (scope_clause, scope_bind) = scope.sql_condition();
        let mut conditions = vec![format!("({})", scope_clause)];

        if filters.search_text.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(customer_name), $search) \
                 OR string::contains(string::lowercase(customer_email ?? ''), $search) \
                 OR string::contains(string::lowercase(customer_tel), $search) \
                 OR string::contains(string::lowercase(postcode), $search))"
                    .to_string(),
            );
        }
        if filters.status.is_some() {
            conditions.push("status = $status".to_string());
        }
        if filters.survey_status.is_some() {
            conditions.push("survey_status = $survey_status".to_string());
        }
        if filters.account_manager.is_some() {
            conditions.push("account_manager = $account_manager".to_string());
        }
        if filters.field_rep.is_some() {
            conditions.push("field_rep = $field_rep".to_string());
        }
        if filters.postcode.is_some() {
            conditions.push("postcode = $postcode".to_string());
        }
        if filters.created_from.is_some() {
            conditions.push("created_at >= $created_from".to_string());
        }
        if filters.created_to.is_some() {
            conditions.push("created_at <= $created_to".to_string());
        }

        // Stable id tiebreak keeps pagination deterministic when sort keys tie
        let sql = format!(
            "SELECT * FROM lead WHERE {} ORDER BY {} {}, id ASC",
            conditions.join(" AND "),
            sort.column.as_str(),
            sort.direction.as_str(),
        );

        let mut query = self.base.db().query(sql);
        if let Some(bind) = scope_bind {
            query = query.bind(bind);
        }
        if let Some(ref search) = filters.search_text {
            query = query.bind(("search", search.to_lowercase()));
        }
        if let Some(status) = filters.status {
            query = query.bind(("status", status));
        }
        if let Some(survey_status) = filters.survey_status {
            query = query.bind(("survey_status", survey_status));
        }
        if let Some(ref account_manager) = filters.account_manager {
            query = query.bind(("account_manager", account_manager.clone()));
        }
        if let Some(ref field_rep) = filters.field_rep {
            query = query.bind(("field_rep", field_rep.clone()));
        }
        if let Some(ref postcode) = filters.postcode {
            query = query.bind(("postcode", postcode.clone()));
        }
        if let Some(created_from) = filters.created_from {
            query = query.bind(("created_from", created_from));
        }
        if let Some(created_to) = filters.created_to {
            query = query.bind(("created_to", created_to));
        }

        // Workaround: SurrealDB embedded mode (kv-rocksdb) drops the first record
        // when LIMIT is combined with WHERE on indexed fields. Scoped result sets
        // are bounded, so fetch the full match and paginate in memory.
        let leads: Vec<Lead> = query.await?.take(0)?;

        let total = leads.len();
        let start = page.offset().min(total);
        let end = (start + page.page_size).min(total);
        let rows = leads[start..end].to_vec();
        Ok((rows, total))
    }

    /// Find a lead by id with the scope condition applied in the query itself.
    /// An existing but out-of-scope record comes back as None.
    pub async fn find_in_scope(&self, scope: &LeadScope, id: &str) -> RepoResult<Option<Lead>> {
        let thing = parse_lead_id(id)?;
        let (scope_clause, scope_bind) = scope.sql_condition();
        let sql = format!("SELECT * FROM lead WHERE id = $thing AND ({})", scope_clause);

        let mut query = self.base.db().query(sql).bind(("thing", thing));
        if let Some(bind) = scope_bind {
            query = query.bind(bind);
        }
        let leads: Vec<Lead> = query.await?.take(0)?;
        Ok(leads.into_iter().next())
    }

    /// Find a lead by id without scoping. Mutation paths re-check scope
    /// against this freshest copy before touching anything.
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Lead>> {
        let thing = parse_lead_id(id)?;
        let lead: Option<Lead> = self.base.db().select(thing).await?;
        Ok(lead)
    }

    /// Create a new lead
    pub async fn create(&self, data: LeadCreate) -> RepoResult<Lead> {
        let lead = data.into_lead(time::now_millis());
        let created: Option<Lead> = self.base.db().create(TABLE).content(lead).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create lead".to_string()))
    }

    /// Partial update via MERGE. Absent payload fields are left untouched.
    pub async fn update(&self, id: &str, data: LeadUpdate) -> RepoResult<Lead> {
        let thing = parse_lead_id(id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data RETURN AFTER")
            .bind(("thing", thing))
            .bind(("data", data))
            .await?;

        result
            .take::<Option<Lead>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Lead {} not found", id)))
    }

    /// Hard delete a lead
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_lead_id(id)?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    /// Metric projection of every scoped lead created inside the range.
    /// Pulls only the columns the aggregators read.
    pub async fn metric_snapshots(
        &self,
        scope: &LeadScope,
        range: DateRange,
    ) -> RepoResult<Vec<LeadSnapshot>> {
        let (scope_clause, scope_bind) = scope.sql_condition();
        let sql = format!(
            "SELECT created_at, survey_booked_date, survey_status, lead_source, lead_cost, \
             account_manager, field_rep \
             FROM lead WHERE ({}) AND created_at >= $from AND created_at <= $to",
            scope_clause
        );

        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("from", range.from))
            .bind(("to", range.to));
        if let Some(bind) = scope_bind {
            query = query.bind(bind);
        }
        let snapshots: Vec<LeadSnapshot> = query.await?.take(0)?;
        Ok(snapshots)
    }
}

fn parse_lead_id(id: &str) -> RepoResult<RecordId> {
    let thing: RecordId = id
        .parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
    if thing.table() != TABLE {
        return Err(RepoError::Validation(format!("Invalid lead ID: {}", id)));
    }
    Ok(thing)
}
