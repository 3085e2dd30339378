//! Expense Repository
//!
//! `expense_date` 按 "YYYY-MM-DD" 存储，范围查询直接做字符串比较。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Expense, ExpenseCategory, ExpenseCreate, ExpenseSnapshot};
use crate::utils::time;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "expense";

#[derive(Clone)]
pub struct ExpenseRepository {
    base: BaseRepository,
}

impl ExpenseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all expenses, newest business day first
    pub async fn find_all(&self) -> RepoResult<Vec<Expense>> {
        let expenses: Vec<Expense> = self
            .base
            .db()
            .query("SELECT * FROM expense ORDER BY expense_date DESC, created_at DESC")
            .await?
            .take(0)?;
        Ok(expenses)
    }

    /// Find expenses inside an inclusive day range, optionally one category
    pub async fn find_in_range(
        &self,
        from_day: &str,
        to_day: &str,
        category: Option<ExpenseCategory>,
    ) -> RepoResult<Vec<Expense>> {
        let mut sql = String::from(
            "SELECT * FROM expense WHERE expense_date >= $from AND expense_date <= $to",
        );
        if category.is_some() {
            sql.push_str(" AND category = $category");
        }
        sql.push_str(" ORDER BY expense_date DESC, created_at DESC");

        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("from", from_day.to_string()))
            .bind(("to", to_day.to_string()));
        if let Some(category) = category {
            query = query.bind(("category", category));
        }
        let expenses: Vec<Expense> = query.await?.take(0)?;
        Ok(expenses)
    }

    /// Create a new expense. Amount invariants are checked upstream.
    pub async fn create(&self, data: ExpenseCreate, created_by: String) -> RepoResult<Expense> {
        let expense = data.into_expense(created_by, time::now_millis());
        let created: Option<Expense> = self.base.db().create(TABLE).content(expense).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create expense".to_string()))
    }

    /// Amount columns of every expense inside an inclusive day range,
    /// for the cost-per-lead aggregation. Expenses are never role-scoped.
    pub async fn amount_snapshots(
        &self,
        from_day: &str,
        to_day: &str,
    ) -> RepoResult<Vec<ExpenseSnapshot>> {
        let snapshots: Vec<ExpenseSnapshot> = self
            .base
            .db()
            .query(
                "SELECT total_amount, online_amount, field_amount \
                 FROM expense WHERE expense_date >= $from AND expense_date <= $to",
            )
            .bind(("from", from_day.to_string()))
            .bind(("to", to_day.to_string()))
            .await?
            .take(0)?;
        Ok(snapshots)
    }
}
