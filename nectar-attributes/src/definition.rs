//! Attribute definitions and canonical naming.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use nectar_fields::FieldSpec;
use nectar_store::{key, TermId};

/// Storage identifiers (meta keys, taxonomy names) cap at 32 characters.
const KEY_BUDGET: usize = 32;

/// One operator-configured attribute of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Canonical name, truncated to fit the storage key budget.
    pub name: String,
    pub label: String,
    pub content_type: String,
    /// Category scope closure: directly assigned terms plus all their
    /// descendants. Empty means the attribute is global.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub categories: BTreeSet<TermId>,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub moderated: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    /// Generated sub-taxonomy name when the edit field declares enumerated
    /// options; such attributes store term memberships, not flat meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    pub edit_field: FieldSpec,
    pub search_field: FieldSpec,
    /// Manual display order of the source definition.
    #[serde(default)]
    pub order: i64,
}

impl AttributeDefinition {
    /// Whether the attribute's values live in term relations.
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Whether the attribute applies within the given categories. An empty
    /// scope applies everywhere.
    pub fn applies_to(&self, categories: &[TermId]) -> bool {
        self.categories.is_empty() || categories.iter().any(|c| self.categories.contains(c))
    }
}

/// Derive an attribute's canonical name from its configured slug.
///
/// The name must fit the key budget once namespaced; relation-backed
/// attributes get the stricter budget of the generated taxonomy identifier
/// `{namespace}{model}_{name}`.
pub fn canonical_name(slug: &str, relation_model: Option<&str>) -> String {
    let reserved = match relation_model {
        Some(model) => key::prefix(&format!("{model}_")).len(),
        None => key::NAMESPACE.len(),
    };
    let budget = KEY_BUDGET.saturating_sub(reserved);
    let mut name = key::sanitize_key(slug);
    name.truncate(budget);
    name
}
