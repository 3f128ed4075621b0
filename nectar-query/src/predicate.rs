//! Compiled, storage-ready query predicates.
//!
//! Three independent clause groups, implicitly AND-ed by the host query:
//! key/value comparisons on flat meta, term-membership clauses, and at most
//! one sort clause. Each attribute contributes to exactly one group, so
//! clause keys never collide.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use nectar_fields::{Cast, Compare};
use nectar_store::TermId;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

/// A flat key/value comparison clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaClause {
    /// Namespaced storage key.
    pub key: String,
    pub compare: Compare,
    pub value: Value,
    pub cast: Cast,
}

/// A term-membership clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermClause {
    /// Namespaced taxonomy name.
    pub taxonomy: String,
    pub terms: Vec<TermId>,
    /// Whether descendants of the listed terms also match. The compiler
    /// always emits `false`; subtree matching is the caller's opt-in.
    pub include_children: bool,
}

/// The single sort clause of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortClause {
    /// Namespaced meta key the results are ordered by.
    pub key: String,
    pub direction: Direction,
    pub cast: Cast,
}

/// A compiled query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPredicate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<MetaClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<TermClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortClause>,
}

impl QueryPredicate {
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty() && self.terms.is_empty() && self.sort.is_none()
    }
}
