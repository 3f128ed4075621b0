//! Query compiler for the Nectar attribute engine
//!
//! Turns submitted search/filter/sort values into [`QueryPredicate`]s, the
//! storage-ready representation the host feeds into its base query.
//! Compilation is total: malformed or missing values drop their clause, a
//! degraded catalog drops its clauses, and nothing ever panics or errors.

pub mod compiler;
pub mod predicate;

pub use compiler::{QueryCompiler, SearchParams};
pub use predicate::{Direction, MetaClause, QueryPredicate, SortClause, TermClause};
