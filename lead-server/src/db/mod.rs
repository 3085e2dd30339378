//! Database Module
//!
//! Embedded SurrealDB over RocksDB. Tables stay SCHEMALESS, the shape is
//! owned by the model structs; indexes cover the scoping and range columns.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "solar";
const DATABASE: &str = "dashboard";

/// Open the embedded database and apply schema definitions.
pub async fn connect(data_dir: &Path) -> Result<Surreal<Db>, AppError> {
    let db: Surreal<Db> = Surreal::new::<RocksDb>(data_dir)
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

    define_schema(&db).await?;

    tracing::info!(
        "Database connection established (SurrealDB RocksDB, ns={} db={})",
        NAMESPACE,
        DATABASE
    );
    Ok(db)
}

/// Idempotent table and index definitions, run at every startup.
pub async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS lead SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS lead_created_at ON TABLE lead COLUMNS created_at;
        DEFINE INDEX IF NOT EXISTS lead_account_manager ON TABLE lead COLUMNS account_manager;
        DEFINE INDEX IF NOT EXISTS lead_field_rep ON TABLE lead COLUMNS field_rep;
        DEFINE INDEX IF NOT EXISTS lead_installer ON TABLE lead COLUMNS installer;

        DEFINE TABLE IF NOT EXISTS expense SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS expense_date ON TABLE expense COLUMNS expense_date;

        DEFINE TABLE IF NOT EXISTS app_user SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS app_user_email ON TABLE app_user COLUMNS email UNIQUE;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;
    Ok(())
}
