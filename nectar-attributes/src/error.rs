//! Error types for catalog operations

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while building derived attribute data.
///
/// Configuration mistakes (unknown field types, malformed settings) are not
/// errors; they degrade to safe defaults. Only the store boundary can fail.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Underlying document store failure
    #[error(transparent)]
    Store(#[from] nectar_store::StoreError),
}
