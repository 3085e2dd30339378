//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen based on:
//! - Reasonable UX limits for names, notes, descriptions
//! - RFC 5321 for email addresses
//! - UK postcode format (max 8 chars incl. space, allow slack for typos)

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// People names: customer, account manager, field rep, installer
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, fall-off reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone numbers, postcodes, property types, categories
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Address lines
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate an email address: non-empty, contains '@', within RFC length.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    let email = value.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("Invalid email"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(AppError::validation(format!(
            "email is too long ({} chars, max {MAX_EMAIL_LEN})",
            email.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}
