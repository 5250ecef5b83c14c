//! Cart errors.
//!
//! Lookups that find nothing are not errors; they return `false`. What is
//! left is the persistence boundary failing.

use thiserror::Error;

use crate::persistence::PersistenceError;

/// Error returned by mutating cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The adapter failed to save or delete the blob.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The cart could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
