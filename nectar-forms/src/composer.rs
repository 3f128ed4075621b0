//! FormComposer builds purpose-specific field sets.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;
use tracing::debug;

use nectar_attributes::{AttributeCatalog, Result};
use nectar_fields::{FieldOption, FieldSpec, OptionsSource, SortSemantics};
use nectar_store::TermId;

/// Status marker added to moderated edit fields on update forms.
pub const MODERATION_STATUS: &str = "requires review";

/// What a composed form is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPurpose {
    Edit,
    Search,
    Filter,
    Sort,
}

/// One compose call.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub content_type: String,
    pub purpose: FormPurpose,
    /// The currently selected category, if any. Attributes scoped outside
    /// its subtree are excluded.
    pub category: Option<TermId>,
    /// Fields the caller declares explicitly; these always precede and
    /// never get overwritten by generated attribute fields.
    pub static_fields: Vec<FieldSpec>,
    /// Edit purpose: the form targets an existing record that already
    /// passed moderation.
    pub updating: bool,
    /// Sort purpose: the request carries a keyword search, so the default
    /// order is relevance rather than date.
    pub keyword_search: bool,
}

impl ComposeRequest {
    pub fn new(content_type: impl Into<String>, purpose: FormPurpose) -> Self {
        Self {
            content_type: content_type.into(),
            purpose,
            category: None,
            static_fields: Vec::new(),
            updating: false,
            keyword_search: false,
        }
    }

    pub fn with_category(mut self, category: TermId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_static_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.static_fields = fields;
        self
    }

    pub fn updating(mut self) -> Self {
        self.updating = true;
        self
    }

    pub fn keyword_search(mut self) -> Self {
        self.keyword_search = true;
        self
    }
}

/// Builds form field sets from the attribute catalog.
pub struct FormComposer {
    catalog: Arc<AttributeCatalog>,
}

impl FormComposer {
    pub fn new(catalog: Arc<AttributeCatalog>) -> Self {
        Self { catalog }
    }

    /// Compose the field set for a request, ordered for display.
    pub async fn compose(&self, req: &ComposeRequest) -> Result<IndexMap<String, FieldSpec>> {
        let mut fields: IndexMap<String, FieldSpec> = IndexMap::new();
        for field in &req.static_fields {
            fields.entry(field.name.clone()).or_insert_with(|| field.clone());
        }

        let scope: Vec<TermId> = req.category.into_iter().collect();
        let attributes = self.catalog.scoped(&req.content_type, &scope).await?;

        match req.purpose {
            FormPurpose::Edit => {
                for (name, attr) in &attributes {
                    if !attr.editable || fields.contains_key(name) {
                        continue;
                    }
                    let mut spec = attr.edit_field.clone();
                    if attr.moderated && req.updating {
                        spec.statuses.push(MODERATION_STATUS.to_string());
                    }
                    fields.insert(name.clone(), spec);
                }
            }
            FormPurpose::Search | FormPurpose::Filter => {
                for (name, attr) in &attributes {
                    let included = match req.purpose {
                        FormPurpose::Search => attr.searchable,
                        _ => attr.filterable,
                    };
                    if included && !fields.contains_key(name) {
                        fields.insert(name.clone(), attr.search_field.clone());
                    }
                }
                if req.purpose == FormPurpose::Filter {
                    self.add_category_field(&mut fields, req).await?;
                }
                self.apply_range_defaults(&mut fields, &req.content_type).await?;
            }
            FormPurpose::Sort => {
                self.add_sort_field(&mut fields, req, &attributes);
            }
        }

        // The selected category rides along as the default of any category
        // field so filter and sort submissions keep their context.
        if let Some(category) = req.category {
            if let Some(field) = fields.get_mut("category") {
                field.default = Some(json!(category));
            }
        }

        fields.sort_by(|_, a, _, b| a.order.cmp(&b.order));
        debug!(
            content_type = %req.content_type,
            purpose = ?req.purpose,
            fields = fields.len(),
            "form composed"
        );
        Ok(fields)
    }

    /// The category filter field: subtree options around the current anchor
    /// with the "All Categories" sentinel first. Options declared by the
    /// caller are kept ahead of the generated list.
    async fn add_category_field(
        &self,
        fields: &mut IndexMap<String, FieldSpec>,
        req: &ComposeRequest,
    ) -> Result<()> {
        let options = self
            .catalog
            .category_options(&req.content_type, req.category)
            .await?;
        let generated: Vec<FieldOption> = options
            .into_iter()
            .map(|o| FieldOption {
                value: o.id.to_string(),
                label: o.label,
                parent: o.parent,
            })
            .collect();

        let mut spec = fields
            .shift_remove("category")
            .unwrap_or_else(|| FieldSpec::new("category", "Category", "select"));
        let mut merged = match spec.options.take() {
            Some(OptionsSource::Inline { options }) => options,
            _ => Vec::new(),
        };
        merged.extend(generated);
        spec.options = Some(OptionsSource::Inline { options: merged });
        fields.insert("category".to_string(), spec);
        Ok(())
    }

    /// One sort select: the default order first, then an option per sortable
    /// attribute according to its field type's sort semantics.
    fn add_sort_field(
        &self,
        fields: &mut IndexMap<String, FieldSpec>,
        req: &ComposeRequest,
        attributes: &IndexMap<String, nectar_attributes::AttributeDefinition>,
    ) {
        let mut options = vec![FieldOption::new(
            "",
            if req.keyword_search { "Relevance" } else { "Date" },
        )];

        for (name, attr) in attributes {
            if !attr.sortable {
                continue;
            }
            let resolved = self.catalog.registry().resolve(&attr.edit_field.kind);
            let label = &attr.search_field.label;
            match resolved.field_type().sort_semantics() {
                SortSemantics::Unsortable => {}
                SortSemantics::AscDesc => {
                    options.push(FieldOption::new(format!("{name}__asc"), format!("{label} \u{2191}")));
                    options.push(FieldOption::new(format!("{name}__desc"), format!("{label} \u{2193}")));
                }
                SortSemantics::Named(direction) => {
                    options.push(FieldOption::new(
                        format!("{name}__{}", direction.to_lowercase()),
                        label.clone(),
                    ));
                }
            }
        }

        let mut spec = fields
            .shift_remove("sort")
            .unwrap_or_else(|| FieldSpec::new("sort", "Sort by", "select"));
        let mut merged = match spec.options.take() {
            Some(OptionsSource::Inline { options }) => options,
            _ => Vec::new(),
        };
        merged.extend(options);
        spec.options = Some(OptionsSource::Inline { options: merged });
        fields.insert("sort".to_string(), spec);
    }

    /// Inject stored min/max as the bounds of range fields that declare
    /// none. Degenerate ranges stay unbounded.
    async fn apply_range_defaults(
        &self,
        fields: &mut IndexMap<String, FieldSpec>,
        content_type: &str,
    ) -> Result<()> {
        for (name, spec) in fields.iter_mut() {
            if spec.kind != "number_range" || spec.min_value.is_some() || spec.max_value.is_some() {
                continue;
            }
            if let Some((min, max)) = self.catalog.range_bounds(content_type, name).await? {
                spec.min_value = Some(min);
                spec.max_value = Some(max);
            }
        }
        Ok(())
    }
}
