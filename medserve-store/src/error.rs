//! Store error types

use thiserror::Error;

/// Error surfaced by the remote store.
///
/// Access functions propagate these verbatim (adding operation context via
/// logging only); they never swallow a primary operation's error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No row matched the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication or row-level permission denial
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Constraint violation reported by the backend
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Response did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend-reported failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
