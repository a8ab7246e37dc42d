//! Error handling utilities for the quill application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.
//!
//! Malformed LLM output is deliberately absent from the taxonomy: it is recovered
//! into a degraded summary at the parsing boundary and never surfaces as an error.

use thiserror::Error;

/// Represents specific error cases that can occur during database operations.
///
/// # Examples
///
/// ```
/// use quill::errors::DatabaseError;
///
/// let error = DatabaseError::NotFound("Entry with id 123 not found".to_string());
/// assert!(format!("{}", error).contains("not found"));
/// ```
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite database error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("Failed to get connection from pool: {0}\n\nThis may indicate database connection issues. Try closing other quill instances.")]
    Pool(#[from] r2d2::Error),

    /// Requested row not found in database.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Custom database error with detailed message.
    #[error("Database error: {0}")]
    Custom(String),
}

/// Represents specific error cases that can occur when talking to the model runtime.
///
/// # Examples
///
/// ```
/// use quill::errors::AIError;
///
/// let error = AIError::ModelNotFound("llama3.2:3b".to_string());
/// assert!(format!("{}", error).contains("llama3.2:3b"));
/// ```
#[derive(Debug, Error)]
pub enum AIError {
    /// The embedding endpoint could not be reached.
    #[error("Embedding service unavailable: {0}. Is Ollama running? Try: ollama serve")]
    EmbeddingUnavailable(String),

    /// The chat completion endpoint could not be reached or timed out.
    #[error("LLM unavailable: {0}. Is Ollama running? Try: ollama serve")]
    LlmUnavailable(String),

    /// Requested model not found in Ollama.
    #[error("Model not found: {0}. Try: ollama pull {0}")]
    ModelNotFound(String),

    /// Invalid or unexpected response from Ollama API.
    #[error("Invalid response from Ollama: {0}")]
    InvalidResponse(String),

    /// A streaming request was stopped because the consumer went away.
    #[error("Streaming request cancelled")]
    Cancelled,
}

/// Represents all possible errors that can occur in the quill application.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use quill::errors::AppError;
///
/// let error = AppError::Config("Missing database path".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing database path");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem or terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An unknown entry, prompt type, or configuration scope was requested.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an invalid argument or filter combination.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Errors related to database operations.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Errors related to AI operations.
    #[error("AI error: {0}")]
    AI(#[from] AIError),
}

impl AppError {
    /// Returns `true` for upstream transport failures that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::AI(AIError::LlmUnavailable(_)) | AppError::AI(AIError::EmbeddingUnavailable(_))
        )
    }

    /// Returns `true` if this error means something the caller asked for does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_) | AppError::Database(DatabaseError::NotFound(_))
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(DatabaseError::Sqlite(e))
    }
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
///
/// # Examples
///
/// ```
/// use quill::errors::{AppResult, AppError};
///
/// fn might_fail() -> AppResult<String> {
///     if false {
///         return Err(AppError::Validation("Something went wrong".to_string()));
///     }
///     Ok("Operation succeeded".to_string())
/// }
/// ```
pub type AppResult<T> = Result<T, AppError>;
