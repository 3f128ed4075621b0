//! Field type registry for the Nectar attribute engine
//!
//! A field type is a named behavior bundle: it sanitizes raw submitted
//! values, validates them against a [`FieldSpec`], and knows how to turn a
//! valid value into a storage filter fragment and whether it can sort.
//! Types are looked up by tag through the [`FieldRegistry`]; unknown tags
//! resolve to an explicit text fallback rather than failing.
//!
//! Validation never errors at the type level; it returns human-readable
//! messages, and callers aggregate them across fields.

pub mod registry;
pub mod spec;
pub mod types;

pub use registry::{FieldRegistry, Resolved};
pub use spec::{FieldOption, FieldSpec, OptionsSource};
pub use types::{
    Cast, CheckboxField, Compare, FieldType, FilterFragment, NumberField, NumberRangeField,
    SelectField, SortSemantics, TextField,
};
