//! Lead Service
//!
//! Query and mutation flows on top of the repository: scope enforcement,
//! the field-level write matrix, required-field validation, and change
//! events for every accepted mutation.
//!
//! 变更路径永远 re-fetch 最新记录再做作用域校验，不信任客户端。
//! 不在作用域内与不存在同样返回 NotFound，不向未授权调用方泄露存在性。

use super::change_feed::{COLLECTION_LEAD, ChangeAction, ChangeFeed};
use crate::auth::{CurrentUser, LeadScope, policy};
use crate::db::models::{Lead, LeadCreate, LeadUpdate, SurveyStatus};
use crate::db::repository::lead::ALLOWED_PAGE_SIZES;
use crate::db::repository::{LeadFilters, LeadPage, LeadRepository, LeadSort};
use crate::security_log;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN,
    validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
    feed: Arc<ChangeFeed>,
}

impl LeadService {
    pub fn new(db: Surreal<Db>, feed: Arc<ChangeFeed>) -> Self {
        Self {
            repo: LeadRepository::new(db),
            feed,
        }
    }

    /// Scoped, filtered, paginated listing plus the pre-pagination total.
    pub async fn list(
        &self,
        user: &CurrentUser,
        filters: &LeadFilters,
        sort: LeadSort,
        page: LeadPage,
    ) -> AppResult<(Vec<Lead>, usize)> {
        if page.page < 1 {
            return Err(AppError::validation("page must be >= 1"));
        }
        if !ALLOWED_PAGE_SIZES.contains(&page.page_size) {
            return Err(AppError::validation(format!(
                "page_size must be one of {:?}",
                ALLOWED_PAGE_SIZES
            )));
        }

        let scope = LeadScope::for_user(user);
        Ok(self.repo.list(&scope, filters, sort, page).await?)
    }

    /// Fetch one lead. Out of scope and nonexistent are indistinguishable.
    pub async fn get(&self, user: &CurrentUser, id: &str) -> AppResult<Lead> {
        let scope = LeadScope::for_user(user);
        self.repo
            .find_in_scope(&scope, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lead {} not found", id)))
    }

    /// Create a lead. Admin and account managers only.
    pub async fn create(&self, user: &CurrentUser, data: LeadCreate) -> AppResult<Lead> {
        if !policy::can_create_leads(user.role) {
            security_log!(
                "WARN",
                "lead_create_denied",
                user_id = user.id.as_str(),
                user_role = user.role.as_str()
            );
            return Err(AppError::forbidden(format!(
                "Role {} cannot create leads",
                user.role
            )));
        }

        validate_required_text(&data.customer_name, "customer_name", MAX_NAME_LEN)?;
        validate_required_text(&data.customer_tel, "customer_tel", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(
            &data.first_line_of_address,
            "first_line_of_address",
            MAX_ADDRESS_LEN,
        )?;
        validate_required_text(&data.postcode, "postcode", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&data.customer_email, "customer_email", MAX_EMAIL_LEN)?;
        validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)?;

        let created = self.repo.create(data).await?;
        let id = created.id.as_ref().map(|id| id.to_string());
        self.feed.publish(
            COLLECTION_LEAD,
            ChangeAction::Created,
            id.as_deref(),
            Some(&created),
        );
        Ok(created)
    }

    /// Partial update. Re-fetches the record, re-checks scope, then accepts
    /// or rejects the payload as a whole against the write matrix.
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: &str,
        data: LeadUpdate,
    ) -> AppResult<Lead> {
        let fields = data.present_fields();
        if fields.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        // 先取最新记录做作用域校验，缺失与越界同样对待
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lead {} not found", id)))?;
        let scope = LeadScope::for_user(user);
        if !scope.matches(&existing) {
            security_log!(
                "WARN",
                "lead_out_of_scope",
                user_id = user.id.as_str(),
                user_role = user.role.as_str(),
                lead_id = id
            );
            return Err(AppError::not_found(format!("Lead {} not found", id)));
        }

        // 全量接受或全量拒绝，不做字段级静默丢弃
        let denied = policy::denied_fields(user.role, &fields);
        if !denied.is_empty() {
            let names: Vec<&str> = denied.iter().map(|f| f.as_str()).collect();
            security_log!(
                "WARN",
                "lead_write_denied",
                user_id = user.id.as_str(),
                user_role = user.role.as_str(),
                lead_id = id,
                denied_fields = names.join(", ")
            );
            return Err(AppError::forbidden(format!(
                "Insufficient permissions: role {} cannot write [{}]",
                user.role,
                names.join(", ")
            )));
        }

        self.validate_update_payload(&data)?;

        let updated = self.repo.update(id, data).await?;
        self.feed.publish(
            COLLECTION_LEAD,
            ChangeAction::Updated,
            Some(id),
            Some(&updated),
        );
        Ok(updated)
    }

    /// Survey outcome shortcut used by the surveys board.
    pub async fn update_survey_status(
        &self,
        user: &CurrentUser,
        id: &str,
        survey_status: SurveyStatus,
    ) -> AppResult<Lead> {
        let data = LeadUpdate {
            survey_status: Some(survey_status),
            ..LeadUpdate::default()
        };
        self.update(user, id, data).await
    }

    /// Delete a lead. Role gate first, then scope on the fresh record.
    pub async fn delete(&self, user: &CurrentUser, id: &str) -> AppResult<bool> {
        if !policy::can_delete_leads(user.role) {
            security_log!(
                "WARN",
                "lead_delete_denied",
                user_id = user.id.as_str(),
                user_role = user.role.as_str(),
                lead_id = id
            );
            return Err(AppError::forbidden(format!(
                "Role {} cannot delete leads",
                user.role
            )));
        }

        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lead {} not found", id)))?;
        let scope = LeadScope::for_user(user);
        if !scope.matches(&existing) {
            return Err(AppError::not_found(format!("Lead {} not found", id)));
        }

        let deleted = self.repo.delete(id).await?;
        if deleted {
            self.feed
                .publish::<()>(COLLECTION_LEAD, ChangeAction::Deleted, Some(id), None);
        }
        Ok(deleted)
    }

    fn validate_update_payload(&self, data: &LeadUpdate) -> AppResult<()> {
        // Required identity fields may be rewritten but never blanked
        if let Some(ref name) = data.customer_name {
            validate_required_text(name, "customer_name", MAX_NAME_LEN)?;
        }
        if let Some(ref tel) = data.customer_tel {
            validate_required_text(tel, "customer_tel", MAX_SHORT_TEXT_LEN)?;
        }
        if let Some(ref address) = data.first_line_of_address {
            validate_required_text(address, "first_line_of_address", MAX_ADDRESS_LEN)?;
        }
        if let Some(ref postcode) = data.postcode {
            validate_required_text(postcode, "postcode", MAX_SHORT_TEXT_LEN)?;
        }
        validate_optional_text(&data.customer_email, "customer_email", MAX_EMAIL_LEN)?;
        validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)?;
        validate_optional_text(&data.installer_notes, "installer_notes", MAX_NOTE_LEN)?;
        validate_optional_text(&data.fall_off_reason, "fall_off_reason", MAX_NOTE_LEN)?;
        Ok(())
    }
}
