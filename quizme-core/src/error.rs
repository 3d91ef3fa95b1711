//! Error types for QuizMe

use thiserror::Error;

/// Main error type for QuizMe operations
#[derive(Error, Debug)]
pub enum QuizMeError {
    /// Quiz id is not known to the store
    #[error("Quiz not found: {0}")]
    NotFound(String),

    /// A required field was missing or empty
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requesting origin is not allowed to embed the quiz
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Backing store failed or holds inconsistent data
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for QuizMe operations
pub type Result<T> = std::result::Result<T, QuizMeError>;
