//! MyGrade Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared grade-domain types, sanitization rules, and logging setup for the
//! MyGrade workspace.
//!
//! # Overview
//!
//! - **Grades**: recognized grade-component fields, numeric coercion, the
//!   "not recorded" sentinel and display formatting
//! - **Sanitize**: per-row cleanup applied to uploaded spreadsheet rows
//! - **Student**: the session snapshot written after a successful lookup
//! - **Logging**: tracing subscriber configuration shared by binaries
//!
//! # Example
//!
//! ```
//! use mygrade_common::grades::{GradeStanding, ScoreDisplay};
//!
//! assert_eq!(ScoreDisplay::from_score(-1.0).to_string(), "Missed");
//! assert_eq!(GradeStanding::from_grade(2.5), GradeStanding::Passing);
//! ```

pub mod error;
pub mod grades;
pub mod logging;
pub mod sanitize;
pub mod student;

// Re-export commonly used types
pub use error::{MyGradeError, Result};
