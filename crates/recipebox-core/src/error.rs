//! Recipe store errors
//!
//! Read failures, write failures and malformed payloads are kept apart so a
//! caller can tell "nothing stored" from "storage broken" from "stored data
//! is corrupt".

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Errors surfaced by [`RecipeStore`](crate::RecipeStore) operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The storage primitive could not be read
    #[error("Recipe storage is unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),

    /// The stored payload is not a well-formed recipe collection
    ///
    /// The source is the JSON parse error, or the UTF-8 error when the
    /// stored bytes are not text at all.
    #[error("Stored recipes under '{key}' are corrupt: {source}")]
    DecodeError {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A keyed operation found no matching recipe
    #[error("Recipe not found: {0}")]
    NotFound(String),

    /// The storage primitive rejected a write; the previous payload is intact
    #[error("Failed to save recipes: {0}")]
    WriteFailed(#[source] StorageError),

    /// The collection could not be serialized
    #[error("Failed to encode recipes: {0}")]
    Encode(#[source] serde_json::Error),

    /// The recipe failed validation
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    /// Another recipe already uses this title
    #[error("A recipe titled '{title}' already exists ({existing})")]
    DuplicateTitle { title: String, existing: Uuid },

    /// A lookup key matched more than one recipe
    #[error("Key '{key}' matches {count} recipes; use a longer id prefix")]
    AmbiguousKey { key: String, count: usize },
}

impl StoreError {
    /// True for errors caused by the key not matching anything
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if retrying after user action can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::StorageUnavailable(e) | StoreError::WriteFailed(e) => e.is_recoverable(),
            StoreError::DecodeError { .. } | StoreError::Encode(_) => false,
            _ => true,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::StorageUnavailable(e) | StoreError::WriteFailed(e) => {
                e.recovery_suggestion()
            }
            StoreError::DecodeError { .. } => Some(
                "The stored collection could not be parsed. Fix or move the data file aside; nothing was overwritten.",
            ),
            StoreError::AmbiguousKey { .. } => Some("Use the full recipe id."),
            StoreError::DuplicateTitle { .. } => {
                Some("Pick a different title or disable reject_duplicate_titles.")
            }
            _ => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
