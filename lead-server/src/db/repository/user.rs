//! User Account Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::auth::Role;
use crate::db::models::{UserAccount, UserCreate, UserUpdate, validate_manager_attribution};
use crate::utils::time;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::RecordId;

const TABLE: &str = "app_user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all accounts ordered by full name
    pub async fn find_all(&self) -> RepoResult<Vec<UserAccount>> {
        let users: Vec<UserAccount> = self
            .base
            .db()
            .query("SELECT * FROM app_user ORDER BY full_name")
            .await?
            .take(0)?;
        Ok(users)
    }

    /// Find account by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<UserAccount>> {
        let thing = parse_user_id(id)?;
        let user: Option<UserAccount> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Find account by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserAccount>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM app_user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<UserAccount> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new account
    pub async fn create(&self, data: UserCreate) -> RepoResult<UserAccount> {
        validate_manager_attribution(data.role, data.account_manager_name.as_deref())
            .map_err(RepoError::Validation)?;

        // Check duplicate email
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already exists",
                data.email
            )));
        }

        let now = time::now_millis();
        let user = UserAccount {
            id: None,
            email: data.email,
            full_name: data.full_name,
            role: data.role,
            account_manager_name: data.account_manager_name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created: Option<UserAccount> = self.base.db().create(TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Update an account. Dropping the FieldRep role clears the manager
    /// attribution, the invariant is re-checked on the merged result.
    pub async fn update(&self, id: &str, data: UserUpdate) -> RepoResult<UserAccount> {
        let thing = parse_user_id(id)?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;

        // Check duplicate email if changing
        if let Some(ref new_email) = data.email
            && new_email != &existing.email
            && self.find_by_email(new_email).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already exists",
                new_email
            )));
        }

        let effective_role = data.role.unwrap_or(existing.role);
        let manager_name = if effective_role == Role::FieldRep {
            data.account_manager_name
                .or(existing.account_manager_name)
        } else {
            None
        };
        validate_manager_attribution(effective_role, manager_name.as_deref())
            .map_err(RepoError::Validation)?;

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    email = $email OR email,
                    full_name = $full_name OR full_name,
                    role = IF $has_role THEN $role ELSE role END,
                    account_manager_name = $manager_name,
                    is_active = IF $has_is_active THEN $is_active ELSE is_active END,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("email", data.email))
            .bind(("full_name", data.full_name))
            .bind(("has_role", data.role.is_some()))
            .bind(("role", data.role))
            .bind(("manager_name", manager_name))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .bind(("updated_at", time::now_millis()))
            .await?;

        result
            .take::<Option<UserAccount>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Soft delete: accounts are deactivated, never removed, so lead
    /// attribution by display name stays resolvable.
    pub async fn deactivate(&self, id: &str) -> RepoResult<UserAccount> {
        let thing = parse_user_id(id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET is_active = false, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", thing))
            .bind(("updated_at", time::now_millis()))
            .await?;

        result
            .take::<Option<UserAccount>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }
}

fn parse_user_id(id: &str) -> RepoResult<RecordId> {
    let thing: RecordId = id
        .parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
    if thing.table() != TABLE {
        return Err(RepoError::Validation(format!("Invalid user ID: {}", id)));
    }
    Ok(thing)
}
