//! Document store boundary for the Nectar attribute engine
//!
//! The engine never talks to a concrete CMS backend directly. Everything it
//! needs from the host (documents with a handful of native columns, flat
//! per-document key/value meta, and hierarchical term relations) is behind
//! the [`DocumentStore`] trait. [`MemoryStore`] is the in-process
//! implementation used by tests and embedding hosts.

pub mod error;
pub mod key;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use key::{prefix, sanitize_key, unprefix};
pub use memory::MemoryStore;
pub use store::DocumentStore;
pub use types::{
    Document, DocumentId, DocumentUpdate, ListQuery, NewDocument, OrderBy, Status, Term, TermId,
};
