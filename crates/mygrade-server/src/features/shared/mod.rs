//! Shared utilities and types for feature modules
//!
//! - **validation**: required-field checks and their user-facing messages
//! - **confirmation**: `?confirm=true` handling for destructive operations
//! - **live**: server-sent event streams over live subscriptions
//! - **test_helpers**: store fixtures and failure injection (test-only)

pub mod confirmation;
pub mod live;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use confirmation::{confirmation_required, ConfirmParams};
pub use validation::{require_fields, RequiredFieldsError};
