//! Error types for MyGrade

use thiserror::Error;

/// Result type alias for MyGrade operations
pub type Result<T> = std::result::Result<T, MyGradeError>;

/// Main error type for shared MyGrade code
#[derive(Error, Debug)]
pub enum MyGradeError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid student snapshot: {0}")]
    InvalidSnapshot(String),
}
