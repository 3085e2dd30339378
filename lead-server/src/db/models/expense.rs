//! Expense Model
//!
//! 费用不按角色做行级过滤，只在聚合侧用于 cost-per-lead 计算。
//! `expense_date` 存 "YYYY-MM-DD" 字符串，按字典序即可做日期范围比较。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use surrealdb::RecordId;

/// Expense ID type
pub type ExpenseId = RecordId;

/// Fixed expense category set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Rent,
    Marketing,
    Salaries,
    Utilities,
    Software,
    Equipment,
    Travel,
    Insurance,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Software => "Software",
            ExpenseCategory::Equipment => "Equipment",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Insurance => "Insurance",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Rent" => Ok(ExpenseCategory::Rent),
            "Marketing" => Ok(ExpenseCategory::Marketing),
            "Salaries" => Ok(ExpenseCategory::Salaries),
            "Utilities" => Ok(ExpenseCategory::Utilities),
            "Software" => Ok(ExpenseCategory::Software),
            "Equipment" => Ok(ExpenseCategory::Equipment),
            "Travel" => Ok(ExpenseCategory::Travel),
            "Insurance" => Ok(ExpenseCategory::Insurance),
            "Other" => Ok(ExpenseCategory::Other),
            _ => Err(format!("unknown expense category: {}", s)),
        }
    }
}

/// Expense model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ExpenseId>,
    /// Business day "YYYY-MM-DD"
    pub expense_date: String,
    pub category: ExpenseCategory,
    pub description: String,
    pub total_amount: f64,
    pub online_amount: f64,
    pub field_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Full name of the admin who recorded it
    pub created_by: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Create expense payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCreate {
    pub expense_date: String,
    pub category: ExpenseCategory,
    pub description: String,
    pub total_amount: f64,
    pub online_amount: f64,
    pub field_amount: f64,
    pub notes: Option<String>,
}

impl ExpenseCreate {
    pub fn into_expense(self, created_by: String, created_at: i64) -> Expense {
        Expense {
            id: None,
            expense_date: self.expense_date,
            category: self.category,
            description: self.description,
            total_amount: self.total_amount,
            online_amount: self.online_amount,
            field_amount: self.field_amount,
            notes: self.notes,
            created_by,
            created_at,
        }
    }
}

/// Aggregation projection of an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    pub total_amount: f64,
    pub online_amount: f64,
    pub field_amount: f64,
}
