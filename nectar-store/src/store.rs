//! The `DocumentStore` trait: everything the engine asks of the host CMS.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::{
    Document, DocumentId, DocumentUpdate, ListQuery, NewDocument, Term, TermId,
};

/// Host-side persistence the attribute engine builds on.
///
/// Three storage surfaces: documents with native columns, flat per-document
/// key/value meta, and hierarchical terms with per-document membership.
/// Absence is `Ok(None)` / `Ok(false)`, never an error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Documents ---

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>>;

    async fn list_documents(&self, query: &ListQuery) -> Result<Vec<Document>>;

    async fn create_document(&self, doc: NewDocument) -> Result<DocumentId>;

    /// Returns `false` when the document does not exist.
    async fn update_document(&self, id: DocumentId, update: DocumentUpdate) -> Result<bool>;

    async fn delete_document(&self, id: DocumentId) -> Result<bool>;

    // --- Flat meta ---

    async fn get_meta(&self, id: DocumentId, key: &str) -> Result<Option<Value>>;

    async fn all_meta(&self, id: DocumentId) -> Result<HashMap<String, Value>>;

    async fn set_meta(&self, id: DocumentId, key: &str, value: Value) -> Result<()>;

    /// Minimum and maximum numeric value of a meta key across published
    /// documents of a content type. Documents missing the key or holding a
    /// non-numeric value are ignored. `None` when no value qualifies.
    async fn meta_min_max(&self, content_type: &str, key: &str) -> Result<Option<(f64, f64)>>;

    // --- Terms ---

    async fn get_term(&self, id: TermId) -> Result<Option<Term>>;

    /// All terms of a taxonomy, ordered by their manual order then id.
    async fn list_terms(&self, taxonomy: &str) -> Result<Vec<Term>>;

    /// Direct children of `parent` (top-level terms when `None`), ordered.
    async fn term_children(&self, taxonomy: &str, parent: Option<TermId>) -> Result<Vec<TermId>>;

    /// Every descendant of a term, depth-first. Excludes the term itself.
    async fn term_descendants(&self, taxonomy: &str, term: TermId) -> Result<Vec<TermId>>;

    /// Ancestor chain from a term's parent up to the root, nearest first.
    async fn term_ancestors(&self, taxonomy: &str, term: TermId) -> Result<Vec<TermId>>;

    // --- Term membership ---

    async fn document_terms(&self, id: DocumentId, taxonomy: &str) -> Result<Vec<TermId>>;

    async fn set_document_terms(
        &self,
        id: DocumentId,
        taxonomy: &str,
        terms: Vec<TermId>,
    ) -> Result<()>;
}
