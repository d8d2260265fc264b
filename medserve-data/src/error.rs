//! Data layer error types

use medserve_store::StoreError;
use thiserror::Error;

/// Error surfaced by the resource access functions and the sync layer.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Requested entity does not exist; surfaced distinctly so callers can
    /// render "not found" instead of a generic failure
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote store failure, propagated verbatim
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Input rejected before any store call was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Replacing owned child rows failed after the parent write succeeded
    #[error("Child write error: {0}")]
    ChildWrite(String),

    /// Serialization error while shaping rows
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AccessError {
    /// Whether a read hitting this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::ChildWrite(_))
    }
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for AccessError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for data layer operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Failure while computing an optimistic cache patch after a confirmed
/// mutation. Always logged, never surfaced: the remote write already
/// succeeded, so the cache falls back to stale and refetches naturally.
#[derive(Debug, Error)]
#[error("cache patch failed: {0}")]
pub struct CachePatchError(pub String);
