//! Error types for store operations

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur at the document store boundary.
///
/// Absence is not an error: lookups return `Ok(None)` and deletes return
/// `Ok(false)` when the target does not exist.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write was rejected by the backing store
    #[error("write rejected for document {id}: {reason}")]
    WriteRejected { id: u64, reason: String },

    /// A term referenced a parent that does not exist
    #[error("unknown parent term: {parent}")]
    UnknownParent { parent: u64 },

    /// The backing store failed in a backend-specific way
    #[error("store backend error: {0}")]
    Backend(String),
}
