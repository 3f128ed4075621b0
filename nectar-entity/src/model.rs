//! EntityModel hydrates and persists records through a schema table.
//!
//! Persistence is two-phase: every field is sanitized and validated first,
//! and nothing is written unless all fields pass. The owning document is
//! always written before any meta or relation write, so a failed document
//! write leaves the store untouched.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use nectar_fields::FieldRegistry;
use nectar_store::{
    prefix, sanitize_key, Document, DocumentId, DocumentStore, DocumentUpdate, NewDocument,
    Status, TermId,
};

use crate::error::{EntityError, Result};
use crate::record::EntityRecord;
use crate::schema::{AliasColumn, ContentSchema, FieldStrategy};

/// Validation failures of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldErrors {
    pub field: String,
    pub messages: Vec<String>,
}

/// What a persist call produced. Invalid input is an outcome, not an error.
#[derive(Debug)]
pub enum PersistOutcome {
    Saved(DocumentId),
    Invalid(Vec<FieldErrors>),
}

/// A content type's persistence gateway: one schema, one store, one registry.
pub struct EntityModel {
    store: Arc<dyn DocumentStore>,
    registry: Arc<FieldRegistry>,
    schema: ContentSchema,
}

impl EntityModel {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<FieldRegistry>,
        schema: ContentSchema,
    ) -> Self {
        Self {
            store,
            registry,
            schema,
        }
    }

    pub fn schema(&self) -> &ContentSchema {
        &self.schema
    }

    /// Load a record by document id. `None` when the document does not exist
    /// or belongs to another content type.
    pub async fn hydrate(&self, id: DocumentId) -> Result<Option<EntityRecord>> {
        let Some(doc) = self.store.get_document(id).await? else {
            return Ok(None);
        };
        if doc.content_type != self.schema.content_type() {
            return Ok(None);
        }
        let mut record = EntityRecord::new(doc.content_type.clone());
        record.id = Some(id);
        for (name, binding) in self.schema.fields() {
            let value = match &binding.strategy {
                FieldStrategy::Alias(column) => alias_value(&doc, *column),
                FieldStrategy::Relation(taxonomy) => {
                    let terms = self.store.document_terms(id, &prefix(taxonomy)).await?;
                    if terms.is_empty() {
                        Value::Null
                    } else {
                        Value::Array(terms.into_iter().map(Value::from).collect())
                    }
                }
                FieldStrategy::Attribute => self
                    .store
                    .get_meta(id, &prefix(name))
                    .await?
                    .unwrap_or(Value::Null),
            };
            record.set(name.clone(), value);
        }
        Ok(Some(record))
    }

    /// Validate and write a record. Creates the document when the record has
    /// no id, updates it otherwise; the record's values are replaced by their
    /// sanitized forms either way.
    ///
    /// All fields are validated before anything is written. The document
    /// write comes first; meta and relation writes only run once it
    /// succeeded. Updating an id that no longer exists is an error.
    pub async fn persist(&self, record: &mut EntityRecord) -> Result<PersistOutcome> {
        let mut errors = Vec::new();
        for (name, binding) in self.schema.fields() {
            let resolved = self.registry.resolve(&binding.spec.kind);
            let ty = resolved.field_type();
            let sanitized = ty.sanitize(record.get(name));
            let messages = ty.validate(&binding.spec, &sanitized);
            if !messages.is_empty() {
                errors.push(FieldErrors {
                    field: name.clone(),
                    messages,
                });
            }
            record.set(name.clone(), sanitized);
        }
        if !errors.is_empty() {
            return Ok(PersistOutcome::Invalid(errors));
        }

        let mut title = None;
        let mut slug = None;
        let mut status = None;
        let mut menu_order = None;
        let mut meta: Vec<(String, Value)> = Vec::new();
        let mut relations: Vec<(String, Vec<TermId>)> = Vec::new();
        for (name, binding) in self.schema.fields() {
            let value = record.get(name).clone();
            match &binding.strategy {
                FieldStrategy::Alias(column) => match column {
                    AliasColumn::Title => title = value.as_str().map(str::to_string),
                    AliasColumn::Slug => slug = value.as_str().map(str::to_string),
                    AliasColumn::Status => status = serde_json::from_value(value).ok(),
                    AliasColumn::MenuOrder => menu_order = value.as_f64().map(|n| n as i64),
                },
                FieldStrategy::Relation(taxonomy) => {
                    relations.push((prefix(taxonomy), term_ids(&value)));
                }
                FieldStrategy::Attribute => meta.push((prefix(name), value)),
            }
        }

        let id = match record.id {
            None => {
                let title = title.unwrap_or_default();
                let slug = slug.unwrap_or_else(|| sanitize_key(&title));
                let doc = NewDocument {
                    content_type: self.schema.content_type().to_string(),
                    title,
                    slug,
                    status: status.unwrap_or(Status::Published),
                    menu_order: menu_order.unwrap_or(0),
                };
                let id = self.store.create_document(doc).await?;
                record.id = Some(id);
                id
            }
            Some(id) => {
                let update = DocumentUpdate {
                    title,
                    slug,
                    status,
                    menu_order,
                };
                if !self.store.update_document(id, update).await? {
                    return Err(EntityError::DocumentWrite { id });
                }
                id
            }
        };

        for (key, value) in meta {
            self.store.set_meta(id, &key, value).await?;
        }
        for (taxonomy, terms) in relations {
            self.store.set_document_terms(id, &taxonomy, terms).await?;
        }
        debug!(id, content_type = self.schema.content_type(), "record persisted");
        Ok(PersistOutcome::Saved(id))
    }

    /// Delete a record's document and everything attached to it. `false`
    /// when the document was already gone.
    pub async fn remove(&self, id: DocumentId) -> Result<bool> {
        Ok(self.store.delete_document(id).await?)
    }
}

fn alias_value(doc: &Document, column: AliasColumn) -> Value {
    match column {
        AliasColumn::Title => Value::String(doc.title.clone()),
        AliasColumn::Slug => Value::String(doc.slug.clone()),
        AliasColumn::Status => serde_json::to_value(doc.status).unwrap_or(Value::Null),
        AliasColumn::MenuOrder => Value::Number(doc.menu_order.into()),
    }
}

/// Term ids out of a sanitized relation value. Hosts post term ids as
/// numbers or numeric strings; anything else is dropped.
fn term_ids(value: &Value) -> Vec<TermId> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
