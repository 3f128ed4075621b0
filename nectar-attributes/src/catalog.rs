//! AttributeCatalog loads attribute definitions per content type.
//!
//! Definitions are ordinary documents of the `{model}_attribute` content
//! type, authored by the configuration surface: flags and per-context field
//! settings live in flat meta, category assignments as term relations. The
//! catalog turns them into [`AttributeDefinition`]s and memoizes the result
//! until the next epoch bump.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use nectar_fields::{FieldRegistry, FieldSpec, OptionsSource};
use nectar_store::{key, Document, DocumentStore, ListQuery, TermId};

use crate::cache::DerivedCache;
use crate::definition::{canonical_name, AttributeDefinition};
use crate::error::Result;

/// Catalogs above this size are recomputed on every request rather than
/// cached.
const CATALOG_CACHE_CAP: usize = 100;

/// Category option lists above this size are not cached.
const OPTIONS_CACHE_CAP: usize = 1000;

/// One entry of a category option list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOption {
    /// Term id; `0` is the "All Categories" sentinel.
    pub id: TermId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TermId>,
}

/// Per-content-type attribute catalog with derived-data caching.
pub struct AttributeCatalog {
    store: Arc<dyn DocumentStore>,
    registry: Arc<FieldRegistry>,
    cache: Arc<DerivedCache>,
}

impl AttributeCatalog {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<FieldRegistry>,
        cache: Arc<DerivedCache>,
    ) -> Self {
        Self {
            store,
            registry,
            cache,
        }
    }

    pub fn registry(&self) -> &Arc<FieldRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<DerivedCache> {
        &self.cache
    }

    /// The ordered attribute catalog of a content type.
    ///
    /// Configuration mistakes degrade per attribute (unknown field types
    /// become text, missing settings keep registry defaults); only the store
    /// boundary can fail.
    pub async fn load(&self, model: &str) -> Result<IndexMap<String, AttributeDefinition>> {
        let query = ListQuery::published(format!("{model}_attribute"));
        let group = format!("{model}_attribute");
        let cache_key = json!({ "query": query, "format": "attributes" });

        if let Some(attributes) = self
            .cache
            .get::<IndexMap<String, AttributeDefinition>>(&group, &cache_key)
        {
            debug!(model, count = attributes.len(), "attribute catalog cache hit");
            return Ok(attributes);
        }

        let documents = self.store.list_documents(&query).await?;
        let mut attributes = IndexMap::new();

        for document in documents {
            let definition = self.build_definition(model, &document).await?;
            attributes.insert(definition.name.clone(), definition);
        }

        if attributes.len() <= CATALOG_CACHE_CAP {
            self.cache.set(&group, &cache_key, &attributes);
        }
        debug!(model, count = attributes.len(), "attribute catalog built");

        Ok(attributes)
    }

    /// The catalog filtered to attributes applicable within the given
    /// categories. Pass the category closure the caller already knows about
    /// (a single selected term is enough, since definitions carry their own
    /// descendant closure).
    pub async fn scoped(
        &self,
        model: &str,
        categories: &[TermId],
    ) -> Result<IndexMap<String, AttributeDefinition>> {
        let mut attributes = self.load(model).await?;
        attributes.retain(|_, def| def.applies_to(categories));
        Ok(attributes)
    }

    /// Signal that the content type's attribute or category configuration
    /// changed. Orphans every cached catalog, option list and range for the
    /// model.
    pub fn invalidate(&self, model: &str) {
        self.cache.invalidate(&format!("{model}_attribute"));
        self.cache.invalidate(&format!("{model}_category"));
        self.cache.invalidate(model);
    }

    async fn build_definition(
        &self,
        model: &str,
        document: &Document,
    ) -> Result<AttributeDefinition> {
        let meta = self.store.all_meta(document.id).await?;

        // Category scope: assigned terms plus their descendant closure.
        let category_taxonomy = key::prefix(&format!("{model}_category"));
        let assigned = self
            .store
            .document_terms(document.id, &category_taxonomy)
            .await?;
        let mut categories: BTreeSet<TermId> = assigned.iter().copied().collect();
        for term in assigned {
            categories.extend(
                self.store
                    .term_descendants(&category_taxonomy, term)
                    .await?,
            );
        }

        let (mut edit_field, edit_has_options) = self.build_spec("edit", document, &meta);
        let (mut search_field, _) = self.build_spec("search", document, &meta);

        // Attributes with enumerated options are backed by a generated
        // sub-taxonomy instead of a flat key, which tightens the name budget.
        let (name, relation) = if edit_has_options {
            let name = canonical_name(&document.slug, Some(model));
            let relation = format!("{model}_{name}");
            let taxonomy = key::prefix(&relation);
            edit_field.options = Some(OptionsSource::Terms {
                taxonomy: taxonomy.clone(),
            });
            search_field.options = Some(OptionsSource::Terms { taxonomy });
            (name, Some(relation))
        } else {
            (canonical_name(&document.slug, None), None)
        };
        edit_field.name = name.clone();
        search_field.name = name.clone();

        Ok(AttributeDefinition {
            name,
            label: document.title.clone(),
            content_type: model.to_string(),
            categories,
            editable: flag(&meta, "editable"),
            moderated: flag(&meta, "moderated"),
            searchable: flag(&meta, "searchable"),
            filterable: flag(&meta, "filterable"),
            sortable: flag(&meta, "sortable"),
            relation,
            edit_field,
            search_field,
            order: document.menu_order,
        })
    }

    /// Build one context's field spec from stored settings. Returns the spec
    /// and whether the resolved type declares enumerated options.
    fn build_spec(
        &self,
        context: &str,
        document: &Document,
        meta: &HashMap<String, Value>,
    ) -> (FieldSpec, bool) {
        let mut spec = FieldSpec::new("", document.title.clone(), "text")
            .with_order(100 + document.menu_order.max(0));
        let mut has_options = false;

        let stored_type = meta
            .get(&key::prefix(&format!("{context}_field_type")))
            .and_then(Value::as_str)
            .map(key::sanitize_key)
            .filter(|t| !t.is_empty());

        if let Some(tag) = stored_type {
            let resolved = self.registry.resolve(&tag);
            if resolved.is_fallback() {
                warn!(
                    attribute = %document.slug,
                    context,
                    tag,
                    "unregistered field type, using text"
                );
            } else {
                let field_type = resolved.field_type();
                spec.kind = tag;
                has_options = field_type.settings().contains(&"options");
                for setting in field_type.settings() {
                    let stored = meta.get(&key::prefix(&format!("{context}_field_{setting}")));
                    if let Some(value) = stored {
                        spec.apply_setting(setting, value);
                    }
                }
            }
        }

        (spec, has_options)
    }

    /// Ordered category options around an anchor term: its ancestor chain,
    /// the anchor itself and its direct children (top-level categories when
    /// no anchor is given), prepended with the "All Categories" sentinel.
    pub async fn category_options(
        &self,
        model: &str,
        anchor: Option<TermId>,
    ) -> Result<Vec<CategoryOption>> {
        let taxonomy = key::prefix(&format!("{model}_category"));
        let group = format!("{model}_category");
        let cache_key = json!({ "parent": anchor, "fields": "ids", "include_tree": true });

        let ids: Vec<TermId> = match self.cache.get(&group, &cache_key) {
            Some(ids) => ids,
            None => {
                let mut ids = match anchor {
                    None => self.store.term_children(&taxonomy, None).await?,
                    Some(anchor) => {
                        let mut ids = vec![anchor];
                        ids.extend(self.store.term_ancestors(&taxonomy, anchor).await?);
                        ids.extend(self.store.term_children(&taxonomy, Some(anchor)).await?);
                        ids
                    }
                };
                ids.dedup();
                if ids.len() <= OPTIONS_CACHE_CAP {
                    self.cache.set(&group, &cache_key, &ids);
                }
                ids
            }
        };

        let mut terms = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(term) = self.store.get_term(id).await? {
                terms.push(term);
            }
        }
        terms.sort_by_key(|t| (t.order, t.id));

        let mut options = vec![CategoryOption {
            id: 0,
            label: "All Categories".to_string(),
            parent: None,
        }];
        options.extend(terms.into_iter().map(|t| CategoryOption {
            id: t.id,
            label: t.label,
            parent: t.parent,
        }));
        Ok(options)
    }

    /// The stored minimum and maximum of a numeric attribute across the
    /// content type's published documents. `None` when no value exists or
    /// the range is degenerate (`min == max`).
    pub async fn range_bounds(&self, model: &str, name: &str) -> Result<Option<(f64, f64)>> {
        let meta_key = key::prefix(name);
        let cache_key = json!({
            "content_type": model,
            "meta_key": meta_key,
            "aggregate": "minmax",
        });

        let range = match self.cache.get::<(f64, f64)>(model, &cache_key) {
            Some(range) => Some(range),
            None => {
                let range = self.store.meta_min_max(model, &meta_key).await?;
                if let Some(range) = range {
                    self.cache.set(model, &cache_key, &range);
                }
                range
            }
        };

        Ok(range.filter(|(min, max)| min != max))
    }
}

fn flag(meta: &HashMap<String, Value>, name: &str) -> bool {
    match meta.get(&key::prefix(name)) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        Some(Value::String(s)) => !s.is_empty() && s != "0" && s != "false",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nectar_store::{MemoryStore, NewDocument, Status};

    struct Fixture {
        store: Arc<MemoryStore>,
        catalog: AttributeCatalog,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let catalog = AttributeCatalog::new(
            store.clone(),
            Arc::new(FieldRegistry::with_builtins()),
            Arc::new(DerivedCache::new()),
        );
        Fixture { store, catalog }
    }

    async fn seed_attribute(
        store: &MemoryStore,
        model: &str,
        slug: &str,
        order: i64,
        meta: &[(&str, Value)],
    ) -> u64 {
        let id = store
            .create_document(NewDocument {
                content_type: format!("{model}_attribute"),
                title: slug.to_uppercase(),
                slug: slug.to_string(),
                status: Status::Published,
                menu_order: order,
            })
            .await
            .unwrap();
        for (name, value) in meta {
            store
                .set_meta(id, &key::prefix(name), value.clone())
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn load_orders_by_menu_order() {
        let f = fixture();
        seed_attribute(&f.store, "listing", "beds", 2, &[]).await;
        seed_attribute(&f.store, "listing", "price", 1, &[]).await;

        let attributes = f.catalog.load("listing").await.unwrap();
        let names: Vec<&str> = attributes.keys().map(String::as_str).collect();
        assert_eq!(names, ["price", "beds"]);
        assert_eq!(attributes["price"].edit_field.order, 101);
    }

    #[tokio::test]
    async fn field_settings_copied_from_meta() {
        let f = fixture();
        seed_attribute(
            &f.store,
            "listing",
            "price",
            0,
            &[
                ("filterable", json!("1")),
                ("sortable", json!(true)),
                ("edit_field_type", json!("number")),
                ("edit_field_required", json!("1")),
                ("edit_field_min_value", json!("0")),
                ("search_field_type", json!("number_range")),
            ],
        )
        .await;

        let attributes = f.catalog.load("listing").await.unwrap();
        let price = &attributes["price"];
        assert!(price.filterable && price.sortable && !price.editable);
        assert_eq!(price.edit_field.kind, "number");
        assert!(price.edit_field.required);
        assert_eq!(price.edit_field.min_value, Some(0.0));
        assert_eq!(price.search_field.kind, "number_range");
        assert!(price.relation.is_none());
    }

    #[tokio::test]
    async fn unknown_field_type_degrades_to_text() {
        let f = fixture();
        seed_attribute(
            &f.store,
            "listing",
            "gallery",
            0,
            &[("edit_field_type", json!("attachment_gallery"))],
        )
        .await;

        let attributes = f.catalog.load("listing").await.unwrap();
        assert_eq!(attributes["gallery"].edit_field.kind, "text");
    }

    #[tokio::test]
    async fn select_attribute_is_relation_backed() {
        let f = fixture();
        seed_attribute(
            &f.store,
            "listing",
            "color",
            0,
            &[("edit_field_type", json!("select"))],
        )
        .await;

        let attributes = f.catalog.load("listing").await.unwrap();
        let color = &attributes["color"];
        assert_eq!(color.relation.as_deref(), Some("listing_color"));
        match &color.search_field.options {
            Some(OptionsSource::Terms { taxonomy }) => assert_eq!(taxonomy, "nc_listing_color"),
            other => panic!("expected terms options, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn relation_name_uses_stricter_budget() {
        let f = fixture();
        let slug = "an-extremely-verbose-attribute-slug";
        seed_attribute(
            &f.store,
            "listing",
            slug,
            0,
            &[("edit_field_type", json!("select"))],
        )
        .await;

        let attributes = f.catalog.load("listing").await.unwrap();
        let (name, def) = attributes.first().unwrap();
        assert!(key::prefix(&format!("listing_{name}")).len() <= 32);
        assert_eq!(def.relation.as_deref(), Some(format!("listing_{name}").as_str()));
    }

    #[tokio::test]
    async fn category_scope_is_transitive() {
        let f = fixture();
        let tax = key::prefix("listing_category");
        let parent = f.store.insert_term(&tax, "Homes", None, 0).unwrap();
        let child = f.store.insert_term(&tax, "Cabins", Some(parent), 0).unwrap();
        let outside = f.store.insert_term(&tax, "Boats", None, 1).unwrap();

        let id = seed_attribute(&f.store, "listing", "beds", 0, &[]).await;
        f.store
            .set_document_terms(id, &tax, vec![parent])
            .await
            .unwrap();

        let attributes = f.catalog.load("listing").await.unwrap();
        let beds = &attributes["beds"];
        assert!(beds.categories.contains(&parent));
        assert!(beds.categories.contains(&child));
        assert!(!beds.categories.contains(&outside));

        let scoped = f.catalog.scoped("listing", &[child]).await.unwrap();
        assert!(scoped.contains_key("beds"));
        let scoped = f.catalog.scoped("listing", &[outside]).await.unwrap();
        assert!(!scoped.contains_key("beds"));
    }

    #[tokio::test]
    async fn catalog_cached_until_invalidated() {
        let f = fixture();
        seed_attribute(&f.store, "listing", "price", 0, &[]).await;
        assert_eq!(f.catalog.load("listing").await.unwrap().len(), 1);

        seed_attribute(&f.store, "listing", "beds", 1, &[]).await;
        // Still served from cache
        assert_eq!(f.catalog.load("listing").await.unwrap().len(), 1);

        f.catalog.invalidate("listing");
        assert_eq!(f.catalog.load("listing").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn oversized_catalog_is_not_cached() {
        let f = fixture();
        for i in 0..101 {
            seed_attribute(&f.store, "listing", &format!("attr{i:03}"), i, &[]).await;
        }
        assert_eq!(f.catalog.load("listing").await.unwrap().len(), 101);

        seed_attribute(&f.store, "listing", "one-more", 200, &[]).await;
        // No cache entry was written, so the new attribute shows up at once
        assert_eq!(f.catalog.load("listing").await.unwrap().len(), 102);
    }

    #[tokio::test]
    async fn category_options_around_anchor() {
        let f = fixture();
        let tax = key::prefix("listing_category");
        let root = f.store.insert_term(&tax, "Homes", None, 0).unwrap();
        let child = f.store.insert_term(&tax, "Cabins", Some(root), 0).unwrap();
        let grandchild = f
            .store
            .insert_term(&tax, "Log cabins", Some(child), 1)
            .unwrap();
        f.store.insert_term(&tax, "Boats", None, 2).unwrap();

        let options = f
            .catalog
            .category_options("listing", Some(child))
            .await
            .unwrap();
        assert_eq!(options[0].id, 0);
        assert_eq!(options[0].parent, None);
        let ids: Vec<TermId> = options.iter().skip(1).map(|o| o.id).collect();
        assert_eq!(ids, vec![root, child, grandchild]);
    }

    #[tokio::test]
    async fn category_options_without_anchor_are_top_level() {
        let f = fixture();
        let tax = key::prefix("listing_category");
        let root = f.store.insert_term(&tax, "Homes", None, 0).unwrap();
        f.store.insert_term(&tax, "Cabins", Some(root), 0).unwrap();
        let boats = f.store.insert_term(&tax, "Boats", None, 1).unwrap();

        let options = f.catalog.category_options("listing", None).await.unwrap();
        let ids: Vec<TermId> = options.iter().skip(1).map(|o| o.id).collect();
        assert_eq!(ids, vec![root, boats]);
    }

    #[tokio::test]
    async fn range_bounds_cached_and_degenerate() {
        let f = fixture();
        for price in ["10", "10", "25"] {
            let id = f
                .store
                .create_document(NewDocument {
                    content_type: "listing".into(),
                    title: "doc".into(),
                    slug: "doc".into(),
                    status: Status::Published,
                    menu_order: 0,
                })
                .await
                .unwrap();
            f.store
                .set_meta(id, &key::prefix("price"), json!(price))
                .await
                .unwrap();
        }

        assert_eq!(
            f.catalog.range_bounds("listing", "price").await.unwrap(),
            Some((10.0, 25.0))
        );
        // Cached: later writes are invisible until the epoch bumps
        let id = f
            .store
            .create_document(NewDocument {
                content_type: "listing".into(),
                title: "doc".into(),
                slug: "doc".into(),
                status: Status::Published,
                menu_order: 0,
            })
            .await
            .unwrap();
        f.store
            .set_meta(id, &key::prefix("price"), json!("99"))
            .await
            .unwrap();
        assert_eq!(
            f.catalog.range_bounds("listing", "price").await.unwrap(),
            Some((10.0, 25.0))
        );
        f.catalog.invalidate("listing");
        assert_eq!(
            f.catalog.range_bounds("listing", "price").await.unwrap(),
            Some((10.0, 99.0))
        );
    }

    #[tokio::test]
    async fn degenerate_range_is_unset() {
        let f = fixture();
        for _ in 0..3 {
            let id = f
                .store
                .create_document(NewDocument {
                    content_type: "listing".into(),
                    title: "doc".into(),
                    slug: "doc".into(),
                    status: Status::Published,
                    menu_order: 0,
                })
                .await
                .unwrap();
            f.store
                .set_meta(id, &key::prefix("price"), json!("10"))
                .await
                .unwrap();
        }
        assert_eq!(f.catalog.range_bounds("listing", "price").await.unwrap(), None);
        assert_eq!(f.catalog.range_bounds("listing", "beds").await.unwrap(), None);
    }
}
