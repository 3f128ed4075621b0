//! Core document and term types
//!
//! All types serialize via serde. Documents carry the small set of native
//! columns the engine aliases onto; everything else lives in flat meta or
//! term relations.

use serde::{Deserialize, Serialize};

/// Identifier of a document in the host store.
pub type DocumentId = u64;

/// Identifier of a hierarchical term.
pub type TermId = u64;

/// Publication status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Published,
    Pending,
    Draft,
    Trashed,
}

/// A document with its native columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub content_type: String,
    pub title: String,
    pub slug: String,
    pub status: Status,
    /// Manual display order, ascending.
    pub menu_order: i64,
}

/// Native columns for creating a document. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub content_type: String,
    pub title: String,
    pub slug: String,
    pub status: Status,
    #[serde(default)]
    pub menu_order: i64,
}

/// Partial update of a document's native columns. `None` leaves the column
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_order: Option<i64>,
}

/// Column documents are listed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    Id,
    MenuOrder,
}

/// Arguments for listing documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub order_by: OrderBy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Published documents of a content type, in manual display order.
    pub fn published(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            status: Some(Status::Published),
            order_by: OrderBy::MenuOrder,
            limit: None,
        }
    }
}

/// A hierarchical term. Terms form a parent-pointer tree per taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub taxonomy: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TermId>,
    #[serde(default)]
    pub order: i64,
}
