//! Error types for entity persistence

use thiserror::Error;

use nectar_store::DocumentId;

/// Result type for entity operations
pub type Result<T> = std::result::Result<T, EntityError>;

/// Errors that can occur while hydrating or persisting entities.
///
/// Validation failures are not errors; they come back as data in
/// [`crate::PersistOutcome::Invalid`].
#[derive(Debug, Error)]
pub enum EntityError {
    /// The owning document write failed; no meta or relation writes were
    /// attempted.
    #[error("document write failed for {id}")]
    DocumentWrite { id: DocumentId },

    /// Underlying document store failure
    #[error(transparent)]
    Store(#[from] nectar_store::StoreError),
}
