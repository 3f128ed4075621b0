//! QueryCompiler turns submitted values into storage predicates.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use nectar_attributes::{AttributeCatalog, AttributeDefinition};
use nectar_fields::{Compare, SortSemantics};
use nectar_store::{key, TermId};

use crate::predicate::{Direction, MetaClause, QueryPredicate, SortClause, TermClause};

/// Raw submitted form values, keyed by field name.
pub type SearchParams = HashMap<String, Value>;

enum Clause {
    Meta(MetaClause),
    Term(TermClause),
}

/// Compiles search submissions against the attribute catalog.
pub struct QueryCompiler {
    catalog: Arc<AttributeCatalog>,
}

impl QueryCompiler {
    pub fn new(catalog: Arc<AttributeCatalog>) -> Self {
        Self { catalog }
    }

    /// Compile a submission into a predicate.
    ///
    /// Total: invalid or missing values omit their clause, and a failing
    /// store degrades to whatever clauses could still be compiled.
    pub async fn compile(
        &self,
        content_type: &str,
        category: Option<TermId>,
        params: &SearchParams,
    ) -> QueryPredicate {
        let mut predicate = QueryPredicate::default();

        let scope: Vec<TermId> = category.into_iter().collect();
        let attributes = match self.catalog.scoped(content_type, &scope).await {
            Ok(attributes) => attributes,
            Err(e) => {
                warn!(content_type, error = %e, "attribute catalog unavailable, compiling bare predicate");
                return predicate;
            }
        };

        self.apply_sort(&mut predicate, &attributes, params);

        // The selected category restricts to the exact term; subtree
        // matching is the caller's opt-in on its base query.
        if let Some(term) = category {
            predicate.terms.push(TermClause {
                taxonomy: key::prefix(&format!("{content_type}_category")),
                terms: vec![term],
                include_children: false,
            });
        }

        for (name, attr) in &attributes {
            if !attr.searchable && !attr.filterable {
                continue;
            }
            match self.compile_attribute(content_type, name, attr, params).await {
                Some(Clause::Meta(clause)) => predicate.meta.push(clause),
                Some(Clause::Term(clause)) => predicate.terms.push(clause),
                None => {}
            }
        }

        predicate
    }

    /// Resolve the `field__direction` sort parameter. A bare field name
    /// sorts ascending; unknown fields, unsortable fields and unrecognized
    /// direction suffixes fall back to the default ordering.
    fn apply_sort(
        &self,
        predicate: &mut QueryPredicate,
        attributes: &IndexMap<String, AttributeDefinition>,
        params: &SearchParams,
    ) {
        let Some(raw) = params.get("sort").and_then(Value::as_str) else {
            return;
        };
        if raw.is_empty() {
            return;
        }
        let (field, direction) = match raw.split_once("__") {
            Some((field, suffix)) if suffix.eq_ignore_ascii_case("asc") => (field, Direction::Asc),
            Some((field, suffix)) if suffix.eq_ignore_ascii_case("desc") => {
                (field, Direction::Desc)
            }
            Some(_) => return,
            None => (raw, Direction::Asc),
        };

        let Some(attr) = attributes.get(field) else {
            return;
        };
        if !attr.sortable {
            return;
        }
        let resolved = self.catalog.registry().resolve(&attr.edit_field.kind);
        let field_type = resolved.field_type();
        if field_type.sort_semantics() == SortSemantics::Unsortable {
            return;
        }

        // Ordering by a meta key requires the key to exist on the row.
        let meta_key = key::prefix(field);
        predicate.meta.push(MetaClause {
            key: meta_key.clone(),
            compare: Compare::Exists,
            value: Value::Null,
            cast: field_type.cast(),
        });
        predicate.sort = Some(SortClause {
            key: meta_key,
            direction,
            cast: field_type.cast(),
        });
    }

    async fn compile_attribute(
        &self,
        content_type: &str,
        name: &str,
        attr: &AttributeDefinition,
        params: &SearchParams,
    ) -> Option<Clause> {
        let raw = params.get(name)?;

        let mut spec = attr.search_field.clone();
        let resolved = self.catalog.registry().resolve(&spec.kind);
        let field_type = resolved.field_type();
        if !field_type.filterable() {
            return None;
        }

        // Range fields without configured bounds get the stored min/max
        // before validation.
        if spec.kind == "number_range" && spec.min_value.is_none() && spec.max_value.is_none() {
            match self.catalog.range_bounds(content_type, name).await {
                Ok(Some((min, max))) => {
                    spec.min_value = Some(min);
                    spec.max_value = Some(max);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(content_type, attribute = name, error = %e, "range lookup failed");
                }
            }
        }

        let value = field_type.sanitize(raw);
        if !field_type.validate(&spec, &value).is_empty() {
            return None;
        }
        let fragment = field_type.filter(&spec, &value)?;

        match &attr.relation {
            Some(relation) => {
                let terms = term_ids(&fragment.value);
                if terms.is_empty() {
                    return None;
                }
                Some(Clause::Term(TermClause {
                    taxonomy: key::prefix(relation),
                    terms,
                    include_children: false,
                }))
            }
            None => Some(Clause::Meta(MetaClause {
                key: key::prefix(name),
                compare: fragment.compare,
                value: fragment.value,
                cast: fragment.cast,
            })),
        }
    }
}

/// Extract term ids from a filter fragment value; non-ids are dropped.
fn term_ids(value: &Value) -> Vec<TermId> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .collect()
}
