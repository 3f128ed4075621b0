//! Field specs: the serializable description of a single form field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A selectable option of a `select` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            parent: None,
        }
    }
}

/// Where a field's options come from: declared inline, or read from a
/// hierarchical taxonomy (relation-backed attributes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OptionsSource {
    Inline { options: Vec<FieldOption> },
    Terms { taxonomy: String },
}

/// Complete description of one form field.
///
/// `kind` is a registry tag, resolved at use time. A spec can outlive the
/// registration of its type, which is why unknown kinds degrade to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    /// Display order. Static fields sit below 100; attribute-derived fields
    /// default to `100 + definition_order`.
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionsSource>,
    /// Annotation markers, e.g. "requires review" on moderated edit fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<String>,
    /// Default submitted value, e.g. the currently selected category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: kind.into(),
            required: false,
            order: 0,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            multiple: false,
            options: None,
            statuses: Vec::new(),
            default: None,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Apply one stored setting by its registry-declared name. Unknown
    /// names and malformed values are ignored; stored configuration can
    /// never break a spec.
    pub fn apply_setting(&mut self, name: &str, value: &Value) {
        match name {
            "required" => {
                if let Some(flag) = truthy(value) {
                    self.required = flag;
                }
            }
            "multiple" => {
                if let Some(flag) = truthy(value) {
                    self.multiple = flag;
                }
            }
            "min_length" => self.min_length = value.as_u64(),
            "max_length" => self.max_length = value.as_u64(),
            "min_value" => self.min_value = numeric(value),
            "max_value" => self.max_value = numeric(value),
            "options" => {
                if let Ok(options) = serde_json::from_value::<Vec<FieldOption>>(value.clone()) {
                    self.options = Some(OptionsSource::Inline { options });
                }
            }
            _ => {}
        }
    }

    /// Whether this spec declares enumerated options.
    pub fn has_options(&self) -> bool {
        self.options.is_some()
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().unwrap_or(0.0) != 0.0),
        Value::String(s) => Some(!s.is_empty() && s != "0" && s != "false"),
        _ => None,
    }
}

pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spec_yaml_round_trip() {
        let mut spec = FieldSpec::new("price", "Price", "number_range").with_order(103);
        spec.min_value = Some(10.0);
        spec.max_value = Some(25.0);
        let yaml = serde_yaml_ng::to_string(&spec).unwrap();
        let parsed: FieldSpec = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(spec, parsed);
    }

    #[test]
    fn terms_options_round_trip() {
        let mut spec = FieldSpec::new("color", "Color", "select");
        spec.options = Some(OptionsSource::Terms {
            taxonomy: "nc_listing_color".into(),
        });
        let yaml = serde_yaml_ng::to_string(&spec).unwrap();
        let parsed: FieldSpec = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(spec, parsed);
    }

    #[test]
    fn apply_setting_coerces_stored_strings() {
        let mut spec = FieldSpec::new("price", "Price", "number");
        spec.apply_setting("required", &json!("1"));
        spec.apply_setting("min_value", &json!("10"));
        spec.apply_setting("max_value", &json!(99.5));
        assert!(spec.required);
        assert_eq!(spec.min_value, Some(10.0));
        assert_eq!(spec.max_value, Some(99.5));
    }

    #[test]
    fn apply_setting_ignores_garbage() {
        let mut spec = FieldSpec::new("price", "Price", "number");
        spec.apply_setting("min_value", &json!({"nope": true}));
        spec.apply_setting("no_such_setting", &json!(1));
        assert_eq!(spec.min_value, None);
    }

    #[test]
    fn inline_options_from_stored_value() {
        let mut spec = FieldSpec::new("color", "Color", "select");
        spec.apply_setting(
            "options",
            &json!([{"value": "red", "label": "Red"}, {"value": "blue", "label": "Blue"}]),
        );
        match spec.options {
            Some(OptionsSource::Inline { ref options }) => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].value, "red");
            }
            other => panic!("expected inline options, got {other:?}"),
        }
    }
}
