use thiserror::Error;

use crate::storage::error::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected input. Surfaced to the caller, never retried.
    #[error("{0}")]
    Validation(String),

    /// Collaborator fault. Propagated as-is, no retry or backoff here.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
