//! Error types for bulk operations.

use oxide_bulk_core::TranspileError;
use thiserror::Error;

/// Errors raised while preparing or running a bulk mutation.
#[derive(Debug, Error)]
pub enum BulkError {
    /// The request cannot be turned into a statement.
    #[error(transparent)]
    Transpile(#[from] TranspileError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The connection URL does not parse.
    #[error("invalid database url: {0}")]
    Url(#[from] url::ParseError),

    /// No driver is available for the URL scheme.
    #[error("no driver for database url scheme `{0}`")]
    UnsupportedScheme(String),
}

/// Result type alias for bulk operations.
pub type Result<T> = std::result::Result<T, BulkError>;
