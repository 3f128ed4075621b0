//! Attribute catalog for the Nectar attribute engine
//!
//! Operators define attributes (price, color, location, ...) as ordinary
//! documents of a `{model}_attribute` content type; this crate loads them
//! into typed [`AttributeDefinition`]s, resolves their category scope, and
//! derives edit and search field specs through the field type registry.
//!
//! Expensive derived data (full catalogs, category option id lists, numeric
//! min/max ranges) is memoized in a process-wide [`DerivedCache`] keyed by
//! the exact query that produced it, with per-group epoch invalidation.

pub mod cache;
pub mod catalog;
pub mod definition;
pub mod error;

pub use cache::DerivedCache;
pub use catalog::{AttributeCatalog, CategoryOption};
pub use definition::{canonical_name, AttributeDefinition};
pub use error::{CatalogError, Result};
