//! In-memory `DocumentStore` implementation
//!
//! Backs tests and embedding hosts that have no CMS behind them. All state
//! lives behind one `RwLock`; no guard is held across an await point.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::DocumentStore;
use crate::types::{
    Document, DocumentId, DocumentUpdate, ListQuery, NewDocument, OrderBy, Status, Term, TermId,
};

#[derive(Default)]
struct Inner {
    documents: HashMap<DocumentId, Document>,
    meta: HashMap<DocumentId, HashMap<String, Value>>,
    terms: HashMap<TermId, Term>,
    memberships: HashMap<DocumentId, HashMap<String, Vec<TermId>>>,
    next_document_id: DocumentId,
    next_term_id: TermId,
}

/// In-process document store.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_document_id: 1,
                next_term_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Insert a term. The parent, when given, must already exist in the same
    /// taxonomy, so the tree is acyclic by construction.
    pub fn insert_term(
        &self,
        taxonomy: &str,
        label: &str,
        parent: Option<TermId>,
        order: i64,
    ) -> Result<TermId> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if let Some(parent_id) = parent {
            let valid = inner
                .terms
                .get(&parent_id)
                .is_some_and(|t| t.taxonomy == taxonomy);
            if !valid {
                return Err(StoreError::UnknownParent { parent: parent_id });
            }
        }
        let id = inner.next_term_id;
        inner.next_term_id += 1;
        inner.terms.insert(
            id,
            Term {
                id,
                taxonomy: taxonomy.to_string(),
                label: label.to_string(),
                parent,
                order,
            },
        );
        Ok(id)
    }

    fn ordered_terms(inner: &Inner, taxonomy: &str) -> Vec<Term> {
        let mut terms: Vec<Term> = inner
            .terms
            .values()
            .filter(|t| t.taxonomy == taxonomy)
            .cloned()
            .collect();
        terms.sort_by_key(|t| (t.order, t.id));
        terms
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.documents.get(&id).cloned())
    }

    async fn list_documents(&self, query: &ListQuery) -> Result<Vec<Document>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut docs: Vec<Document> = inner
            .documents
            .values()
            .filter(|d| d.content_type == query.content_type)
            .filter(|d| query.status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        match query.order_by {
            OrderBy::Id => docs.sort_by_key(|d| d.id),
            OrderBy::MenuOrder => docs.sort_by_key(|d| (d.menu_order, d.id)),
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn create_document(&self, doc: NewDocument) -> Result<DocumentId> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let id = inner.next_document_id;
        inner.next_document_id += 1;
        inner.documents.insert(
            id,
            Document {
                id,
                content_type: doc.content_type,
                title: doc.title,
                slug: doc.slug,
                status: doc.status,
                menu_order: doc.menu_order,
            },
        );
        Ok(id)
    }

    async fn update_document(&self, id: DocumentId, update: DocumentUpdate) -> Result<bool> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let Some(doc) = inner.documents.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(title) = update.title {
            doc.title = title;
        }
        if let Some(slug) = update.slug {
            doc.slug = slug;
        }
        if let Some(status) = update.status {
            doc.status = status;
        }
        if let Some(menu_order) = update.menu_order {
            doc.menu_order = menu_order;
        }
        Ok(true)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let existed = inner.documents.remove(&id).is_some();
        inner.meta.remove(&id);
        inner.memberships.remove(&id);
        Ok(existed)
    }

    async fn get_meta(&self, id: DocumentId, key: &str) -> Result<Option<Value>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.meta.get(&id).and_then(|m| m.get(key)).cloned())
    }

    async fn all_meta(&self, id: DocumentId) -> Result<HashMap<String, Value>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.meta.get(&id).cloned().unwrap_or_default())
    }

    async fn set_meta(&self, id: DocumentId, key: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .meta
            .entry(id)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn meta_min_max(&self, content_type: &str, key: &str) -> Result<Option<(f64, f64)>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut range: Option<(f64, f64)> = None;
        for doc in inner.documents.values() {
            if doc.content_type != content_type || doc.status != Status::Published {
                continue;
            }
            let value = inner.meta.get(&doc.id).and_then(|m| m.get(key));
            let Some(number) = value.and_then(numeric) else {
                continue;
            };
            range = Some(match range {
                None => (number, number),
                Some((min, max)) => (min.min(number), max.max(number)),
            });
        }
        Ok(range)
    }

    async fn get_term(&self, id: TermId) -> Result<Option<Term>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.terms.get(&id).cloned())
    }

    async fn list_terms(&self, taxonomy: &str) -> Result<Vec<Term>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(Self::ordered_terms(&inner, taxonomy))
    }

    async fn term_children(&self, taxonomy: &str, parent: Option<TermId>) -> Result<Vec<TermId>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(Self::ordered_terms(&inner, taxonomy)
            .into_iter()
            .filter(|t| t.parent == parent)
            .map(|t| t.id)
            .collect())
    }

    async fn term_descendants(&self, taxonomy: &str, term: TermId) -> Result<Vec<TermId>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let terms = Self::ordered_terms(&inner, taxonomy);
        let mut result = Vec::new();
        let mut frontier = vec![term];
        while let Some(current) = frontier.pop() {
            for t in terms.iter().filter(|t| t.parent == Some(current)) {
                result.push(t.id);
                frontier.push(t.id);
            }
        }
        Ok(result)
    }

    async fn term_ancestors(&self, taxonomy: &str, term: TermId) -> Result<Vec<TermId>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut result = Vec::new();
        let mut current = inner
            .terms
            .get(&term)
            .filter(|t| t.taxonomy == taxonomy)
            .and_then(|t| t.parent);
        while let Some(id) = current {
            result.push(id);
            current = inner.terms.get(&id).and_then(|t| t.parent);
        }
        Ok(result)
    }

    async fn document_terms(&self, id: DocumentId, taxonomy: &str) -> Result<Vec<TermId>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .memberships
            .get(&id)
            .and_then(|m| m.get(taxonomy))
            .cloned()
            .unwrap_or_default())
    }

    async fn set_document_terms(
        &self,
        id: DocumentId,
        taxonomy: &str,
        terms: Vec<TermId>,
    ) -> Result<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .memberships
            .entry(id)
            .or_default()
            .insert(taxonomy.to_string(), terms);
        Ok(())
    }
}

/// Interpret a meta value as a number. Host stores keep meta as strings, so
/// numeric strings count.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content_type: &str, title: &str, order: i64) -> NewDocument {
        NewDocument {
            content_type: content_type.into(),
            title: title.into(),
            slug: title.to_lowercase(),
            status: Status::Published,
            menu_order: order,
        }
    }

    #[tokio::test]
    async fn create_and_get_document() {
        let store = MemoryStore::new();
        let id = store.create_document(doc("listing", "Cabin", 0)).await.unwrap();
        let loaded = store.get_document(id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Cabin");
        assert_eq!(loaded.content_type, "listing");
    }

    #[tokio::test]
    async fn list_respects_order_and_status() {
        let store = MemoryStore::new();
        store.create_document(doc("listing", "B", 2)).await.unwrap();
        store.create_document(doc("listing", "A", 1)).await.unwrap();
        let mut draft = doc("listing", "C", 0);
        draft.status = Status::Draft;
        store.create_document(draft).await.unwrap();

        let docs = store
            .list_documents(&ListQuery::published("listing"))
            .await
            .unwrap();
        let titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[tokio::test]
    async fn update_missing_document_returns_false() {
        let store = MemoryStore::new();
        let updated = store
            .update_document(99, DocumentUpdate::default())
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn delete_removes_meta_and_terms() {
        let store = MemoryStore::new();
        let id = store.create_document(doc("listing", "Cabin", 0)).await.unwrap();
        store.set_meta(id, "nc_price", 10.into()).await.unwrap();
        let term = store.insert_term("nc_listing_category", "Homes", None, 0).unwrap();
        store
            .set_document_terms(id, "nc_listing_category", vec![term])
            .await
            .unwrap();

        assert!(store.delete_document(id).await.unwrap());
        assert!(store.get_meta(id, "nc_price").await.unwrap().is_none());
        assert!(store
            .document_terms(id, "nc_listing_category")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn term_tree_traversal() {
        let store = MemoryStore::new();
        let tax = "nc_listing_category";
        let root = store.insert_term(tax, "Homes", None, 0).unwrap();
        let child = store.insert_term(tax, "Cabins", Some(root), 0).unwrap();
        let grandchild = store.insert_term(tax, "Log cabins", Some(child), 0).unwrap();
        let other = store.insert_term(tax, "Boats", None, 1).unwrap();

        assert_eq!(
            store.term_children(tax, None).await.unwrap(),
            vec![root, other]
        );
        assert_eq!(
            store.term_descendants(tax, root).await.unwrap(),
            vec![child, grandchild]
        );
        assert_eq!(
            store.term_ancestors(tax, grandchild).await.unwrap(),
            vec![child, root]
        );
    }

    #[tokio::test]
    async fn insert_term_rejects_unknown_parent() {
        let store = MemoryStore::new();
        let err = store
            .insert_term("nc_listing_category", "Orphan", Some(42), 0)
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownParent { parent: 42 }));
    }

    #[tokio::test]
    async fn meta_min_max_over_published_documents() {
        let store = MemoryStore::new();
        for (title, price) in [("A", "10"), ("B", "10"), ("C", "25")] {
            let id = store.create_document(doc("listing", title, 0)).await.unwrap();
            store
                .set_meta(id, "nc_price", Value::String(price.into()))
                .await
                .unwrap();
        }
        // Draft documents are ignored
        let mut hidden = doc("listing", "D", 0);
        hidden.status = Status::Draft;
        let id = store.create_document(hidden).await.unwrap();
        store.set_meta(id, "nc_price", 1000.into()).await.unwrap();

        let range = store.meta_min_max("listing", "nc_price").await.unwrap();
        assert_eq!(range, Some((10.0, 25.0)));
    }

    #[tokio::test]
    async fn meta_min_max_skips_non_numeric() {
        let store = MemoryStore::new();
        let id = store.create_document(doc("listing", "A", 0)).await.unwrap();
        store
            .set_meta(id, "nc_price", Value::String("call us".into()))
            .await
            .unwrap();
        assert_eq!(store.meta_min_max("listing", "nc_price").await.unwrap(), None);
    }
}
