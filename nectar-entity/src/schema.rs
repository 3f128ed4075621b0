//! Per-content-type field schema: the three-way storage dispatch table.

use indexmap::IndexMap;

use nectar_attributes::AttributeDefinition;
use nectar_fields::FieldSpec;

/// Native document column a field can alias onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasColumn {
    Title,
    Slug,
    Status,
    MenuOrder,
}

/// Where a field's value lives.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldStrategy {
    /// A native document column.
    Alias(AliasColumn),
    /// Term memberships in the named (bare, un-namespaced) taxonomy.
    Relation(String),
    /// A flat meta key derived from the field name.
    Attribute,
}

/// One schema entry: the field's spec plus its storage strategy.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub spec: FieldSpec,
    pub strategy: FieldStrategy,
}

/// The static field table of a content type. Built once at configuration
/// time; every field name resolves to exactly one strategy.
#[derive(Debug, Clone)]
pub struct ContentSchema {
    content_type: String,
    fields: IndexMap<String, FieldBinding>,
}

impl ContentSchema {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn fields(&self) -> &IndexMap<String, FieldBinding> {
        &self.fields
    }

    pub fn binding(&self, name: &str) -> Option<&FieldBinding> {
        self.fields.get(name)
    }

    /// Bind a field to a native column.
    pub fn alias(mut self, column: AliasColumn, spec: FieldSpec) -> Self {
        self.insert(spec, FieldStrategy::Alias(column));
        self
    }

    /// Bind a field to term memberships of a taxonomy.
    pub fn relation(mut self, taxonomy: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(spec, FieldStrategy::Relation(taxonomy.into()));
        self
    }

    /// Bind a field to a flat meta key.
    pub fn attribute(mut self, spec: FieldSpec) -> Self {
        self.insert(spec, FieldStrategy::Attribute);
        self
    }

    /// Bind every cataloged attribute through its edit field. Relation-backed
    /// attributes land on their generated taxonomy, the rest on flat meta.
    /// Names already bound keep their existing binding.
    pub fn with_attributes(
        mut self,
        attributes: &IndexMap<String, AttributeDefinition>,
    ) -> Self {
        for (name, attr) in attributes {
            if self.fields.contains_key(name) {
                continue;
            }
            let strategy = match &attr.relation {
                Some(taxonomy) => FieldStrategy::Relation(taxonomy.clone()),
                None => FieldStrategy::Attribute,
            };
            self.fields.insert(
                name.clone(),
                FieldBinding {
                    spec: attr.edit_field.clone(),
                    strategy,
                },
            );
        }
        self
    }

    fn insert(&mut self, spec: FieldSpec, strategy: FieldStrategy) {
        self.fields
            .insert(spec.name.clone(), FieldBinding { spec, strategy });
    }
}
