//! Generic entity persistence for the Nectar attribute engine
//!
//! An entity record is a bag of named values whose storage is decided by a
//! per-content-type schema table: each field maps to a native document
//! column (alias), a term relation, or a flat meta key. Exactly one of the
//! three, resolved at schema construction, never per call site.

pub mod error;
pub mod model;
pub mod record;
pub mod schema;

pub use error::{EntityError, Result};
pub use model::{EntityModel, FieldErrors, PersistOutcome};
pub use record::EntityRecord;
pub use schema::{AliasColumn, ContentSchema, FieldBinding, FieldStrategy};
