//! EntityRecord, the in-memory record of a content type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nectar_store::DocumentId;

/// A generic record: named values plus an id once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub content_type: String,
    #[serde(default)]
    pub values: IndexMap<String, Value>,
}

impl EntityRecord {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            id: None,
            content_type: content_type.into(),
            values: IndexMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&Value::Null)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(field.into(), value);
        self
    }
}
