//! Tag → field type lookup with an explicit fallback.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::types::{
    CheckboxField, FieldType, NumberField, NumberRangeField, SelectField, TextField,
};

/// Result of resolving a field kind tag.
///
/// Unknown tags degrade to the text type, but the degradation is tagged so
/// callers can log or surface it instead of relying on a silent default.
#[derive(Clone)]
pub enum Resolved {
    Known(Arc<dyn FieldType>),
    Fallback(Arc<dyn FieldType>),
}

impl Resolved {
    pub fn field_type(&self) -> &Arc<dyn FieldType> {
        match self {
            Resolved::Known(ty) | Resolved::Fallback(ty) => ty,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Fallback(_))
    }
}

/// Static registry of field types, populated at startup and looked up by tag.
pub struct FieldRegistry {
    types: HashMap<&'static str, Arc<dyn FieldType>>,
    fallback: Arc<dyn FieldType>,
}

impl FieldRegistry {
    /// A registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            types: HashMap::new(),
            fallback: Arc::new(TextField),
        };
        registry.register(Arc::new(TextField));
        registry.register(Arc::new(NumberField));
        registry.register(Arc::new(NumberRangeField));
        registry.register(Arc::new(SelectField));
        registry.register(Arc::new(CheckboxField));
        registry
    }

    /// Register a field type under its tag, replacing any previous one.
    pub fn register(&mut self, field_type: Arc<dyn FieldType>) {
        self.types.insert(field_type.tag(), field_type);
    }

    /// Resolve a tag. Unknown tags return [`Resolved::Fallback`] (plain text).
    pub fn resolve(&self, tag: &str) -> Resolved {
        match self.types.get(tag) {
            Some(ty) => Resolved::Known(Arc::clone(ty)),
            None => {
                warn!(tag, "unknown field type, falling back to text");
                Resolved::Fallback(Arc::clone(&self.fallback))
            }
        }
    }

    /// Resolve a tag only if registered.
    pub fn get(&self, tag: &str) -> Option<&Arc<dyn FieldType>> {
        self.types.get(tag)
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldSpec;
    use crate::types::{FilterFragment, SortSemantics};
    use serde_json::Value;

    #[test]
    fn resolves_builtins() {
        let registry = FieldRegistry::with_builtins();
        let resolved = registry.resolve("number_range");
        assert!(!resolved.is_fallback());
        assert_eq!(resolved.field_type().tag(), "number_range");
    }

    #[test]
    fn unknown_tag_falls_back_to_text() {
        let registry = FieldRegistry::with_builtins();
        let resolved = registry.resolve("attachment_gallery");
        assert!(resolved.is_fallback());
        assert_eq!(resolved.field_type().tag(), "text");
    }

    struct DistanceField;

    impl crate::types::FieldType for DistanceField {
        fn tag(&self) -> &'static str {
            "distance"
        }
        fn sanitize(&self, raw: &Value) -> Value {
            raw.clone()
        }
        fn validate(&self, _spec: &FieldSpec, _value: &Value) -> Vec<String> {
            Vec::new()
        }
        fn filter(&self, _spec: &FieldSpec, _value: &Value) -> Option<FilterFragment> {
            None
        }
        fn sort_semantics(&self) -> SortSemantics {
            SortSemantics::Named("asc")
        }
    }

    #[test]
    fn custom_types_can_be_registered() {
        let mut registry = FieldRegistry::with_builtins();
        registry.register(Arc::new(DistanceField));
        let resolved = registry.resolve("distance");
        assert!(!resolved.is_fallback());
        assert_eq!(
            resolved.field_type().sort_semantics(),
            SortSemantics::Named("asc")
        );
    }
}
