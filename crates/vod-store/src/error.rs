//! Store error types.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the repository and storage backends.
///
/// `NotFound` is deliberately distinct from backend failures: callers map it
/// to a 404 while backend errors are propagated as-is.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("video not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
