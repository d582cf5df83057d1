//! Domain error types.

use thiserror::Error;

/// Top-level error type for store-backed operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store reported a write conflict or deadlock. The operation
    /// may succeed if the whole transaction is retried.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// A read found no matching row. Resolvers use this internally to
    /// branch to creation; read endpoints surface it as a 404.
    #[error("not found")]
    NotFound,

    /// Malformed input, rejected before a transaction is opened.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other store failure. Terminal for the attempt.
    #[error("store error: {0}")]
    Store(String),
}

impl StoreError {
    /// Whether the error is a transient write conflict worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
