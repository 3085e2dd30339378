//! User Account Model

use super::serde_helpers;
use crate::auth::Role;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// User account ID type
pub type UserId = RecordId;

/// User account model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<UserId>,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    /// Manager attribution, set exactly when `role` is FieldRep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_manager_name: Option<String>,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub account_manager_name: Option<String>,
}

/// Update user payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_manager_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Manager attribution is required for field reps and forbidden otherwise.
pub fn validate_manager_attribution(
    role: Role,
    account_manager_name: Option<&str>,
) -> Result<(), String> {
    let has_manager = account_manager_name.is_some_and(|name| !name.trim().is_empty());
    match (role, has_manager) {
        (Role::FieldRep, false) => {
            Err("field_rep accounts require account_manager_name".to_string())
        }
        (Role::FieldRep, true) => Ok(()),
        (_, true) => Err(format!(
            "account_manager_name is only valid for field_rep accounts, not {}",
            role
        )),
        (_, false) => Ok(()),
    }
}
