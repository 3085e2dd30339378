//! Database Models

// Serde helpers
pub mod serde_helpers;

// Lead Domain
pub mod lead;

// Finance
pub mod expense;

// Accounts
pub mod user;

// Re-exports
pub use lead::{
    Lead, LeadCreate, LeadField, LeadId, LeadSnapshot, LeadSource, LeadStatus, LeadUpdate,
    SurveyStatus,
};
pub use expense::{Expense, ExpenseCategory, ExpenseCreate, ExpenseId, ExpenseSnapshot};
pub use user::{UserAccount, UserCreate, UserId, UserUpdate, validate_manager_attribution};
