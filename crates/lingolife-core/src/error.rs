//! Store error types.
//!
//! These error types represent failures of a word or user backend. They are
//! defined in `lingolife-core` so every backend reports the same taxonomy and
//! the HTTP layer can map them onto status codes without string matching.

use thiserror::Error;

/// Errors that can occur when reading or writing through a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The input was missing a required field or had the wrong shape.
    #[error("{0}")]
    Validation(String),

    /// No record with the given id exists for the user.
    #[error("{0} not found")]
    NotFound(String),

    /// A unique field (username, email) is already taken.
    #[error("{0}")]
    Conflict(String),

    /// The backend could not be reached or answered with an error.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if the caller sent bad input and retrying the same
    /// request cannot succeed.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::NotFound(_) | StoreError::Conflict(_)
        )
    }

    /// Not-found error for a word id.
    pub fn word_not_found(word_id: &str) -> Self {
        StoreError::NotFound(format!("word '{word_id}'"))
    }
}

/// Convenience alias used by the store traits.
pub type StoreResult<T> = Result<T, StoreError>;
