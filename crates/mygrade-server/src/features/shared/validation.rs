//! Shared validation utilities
//!
//! # Examples
//!
//! ```rust,ignore
//! use mygrade_server::features::shared::validation::{require_fields, COMPLETE_ALL_FIELDS};
//!
//! require_fields(
//!     &[("firstName", &first_name), ("lastName", &last_name)],
//!     COMPLETE_ALL_FIELDS,
//! )?;
//! ```

use thiserror::Error;

/// Message of the public lookup form
pub const COMPLETE_ALL_FIELDS: &str = "Please complete all fields.";

/// Message of the admin forms
pub const COMPLETE_REQUIRED_FIELDS: &str = "Please complete all required fields.";

/// One or more required fields were blank
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RequiredFieldsError {
    pub message: &'static str,
    pub missing: Vec<&'static str>,
}

/// Check that every `(name, value)` pair has a non-blank value after trimming.
///
/// The error carries `message` for display and the names of the blank fields.
pub fn require_fields(
    fields: &[(&'static str, &str)],
    message: &'static str,
) -> Result<(), RequiredFieldsError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RequiredFieldsError { message, missing })
    }
}
