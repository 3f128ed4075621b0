//! The `FieldType` trait and the built-in field types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::{numeric, FieldSpec, OptionsSource};

/// Storage-level casting applied when comparing or sorting a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cast {
    Char,
    Numeric,
    Date,
}

/// Comparison operator of a compiled filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    Equals,
    Like,
    In,
    Between,
    GreaterEq,
    LessEq,
    Exists,
}

/// A storage filter fragment produced by a field type for a valid value.
/// The query compiler decides which clause group it lands in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterFragment {
    pub compare: Compare,
    pub value: Value,
    pub cast: Cast,
}

/// How a field type sorts, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSemantics {
    /// No sort option is offered.
    Unsortable,
    /// Offers an ascending and a descending option.
    AscDesc,
    /// Sorts only one way, e.g. distance sorts ascending.
    Named(&'static str),
}

/// A pluggable behavior bundle for one class of attribute values.
///
/// `sanitize` is pure and idempotent. `validate` returns human-readable
/// messages and never panics; an empty list means the value passed.
pub trait FieldType: Send + Sync {
    /// Registry tag, e.g. `"number_range"`.
    fn tag(&self) -> &'static str;

    fn sanitize(&self, raw: &Value) -> Value;

    fn validate(&self, spec: &FieldSpec, value: &Value) -> Vec<String>;

    /// A filter fragment for a sanitized, validated value. `None` for types
    /// that do not filter, or for empty values.
    fn filter(&self, spec: &FieldSpec, value: &Value) -> Option<FilterFragment>;

    fn sort_semantics(&self) -> SortSemantics {
        SortSemantics::Unsortable
    }

    fn cast(&self) -> Cast {
        Cast::Char
    }

    /// Setting names the attribute catalog copies from stored per-context
    /// values into the spec.
    fn settings(&self) -> &'static [&'static str] {
        &["required"]
    }

    fn filterable(&self) -> bool {
        false
    }
}

fn required_message(spec: &FieldSpec) -> String {
    format!("\"{}\" is required", spec.label)
}

fn sanitize_string(raw: &Value) -> Value {
    match raw {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        _ => Value::Null,
    }
}

fn sanitize_number(raw: &Value) -> Value {
    match numeric(raw) {
        Some(n) => serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

// --- text ---

/// Plain text. Also the explicit fallback for unknown field kinds.
pub struct TextField;

impl FieldType for TextField {
    fn tag(&self) -> &'static str {
        "text"
    }

    fn sanitize(&self, raw: &Value) -> Value {
        sanitize_string(raw)
    }

    fn validate(&self, spec: &FieldSpec, value: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        match value {
            Value::String(s) if !s.is_empty() => {
                let chars = s.chars().count() as u64;
                if let Some(min) = spec.min_length {
                    if chars < min {
                        errors.push(format!(
                            "\"{}\" can't be shorter than {min} characters",
                            spec.label
                        ));
                    }
                }
                if let Some(max) = spec.max_length {
                    if chars > max {
                        errors.push(format!(
                            "\"{}\" can't be longer than {max} characters",
                            spec.label
                        ));
                    }
                }
            }
            _ => {
                if spec.required {
                    errors.push(required_message(spec));
                }
            }
        }
        errors
    }

    fn filter(&self, _spec: &FieldSpec, _value: &Value) -> Option<FilterFragment> {
        // Keyword matching on text is the host query's job.
        None
    }

    fn sort_semantics(&self) -> SortSemantics {
        SortSemantics::AscDesc
    }

    fn settings(&self) -> &'static [&'static str] {
        &["required", "min_length", "max_length"]
    }
}

// --- number ---

pub struct NumberField;

impl FieldType for NumberField {
    fn tag(&self) -> &'static str {
        "number"
    }

    fn sanitize(&self, raw: &Value) -> Value {
        sanitize_number(raw)
    }

    fn validate(&self, spec: &FieldSpec, value: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        match value.as_f64() {
            Some(n) => {
                if let Some(min) = spec.min_value {
                    if n < min {
                        errors.push(format!("\"{}\" can't be lower than {min}", spec.label));
                    }
                }
                if let Some(max) = spec.max_value {
                    if n > max {
                        errors.push(format!("\"{}\" can't be greater than {max}", spec.label));
                    }
                }
            }
            None => {
                if spec.required {
                    errors.push(required_message(spec));
                }
            }
        }
        errors
    }

    fn filter(&self, _spec: &FieldSpec, value: &Value) -> Option<FilterFragment> {
        value.as_f64().map(|_| FilterFragment {
            compare: Compare::Equals,
            value: value.clone(),
            cast: Cast::Numeric,
        })
    }

    fn sort_semantics(&self) -> SortSemantics {
        SortSemantics::AscDesc
    }

    fn cast(&self) -> Cast {
        Cast::Numeric
    }

    fn settings(&self) -> &'static [&'static str] {
        &["required", "min_value", "max_value"]
    }

    fn filterable(&self) -> bool {
        true
    }
}

// --- number_range ---

/// A two-bound numeric range, filtered with BETWEEN. Bounds default to the
/// stored min/max of the content type when not declared (injected by the
/// composer/compiler before validation).
pub struct NumberRangeField;

impl FieldType for NumberRangeField {
    fn tag(&self) -> &'static str {
        "number_range"
    }

    fn sanitize(&self, raw: &Value) -> Value {
        let Value::Array(items) = raw else {
            return Value::Null;
        };
        if items.len() != 2 {
            return Value::Null;
        }
        Value::Array(items.iter().map(sanitize_number).collect())
    }

    fn validate(&self, spec: &FieldSpec, value: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        let bounds = match value {
            Value::Array(items) if items.len() == 2 => {
                (items[0].as_f64(), items[1].as_f64())
            }
            _ => (None, None),
        };
        match bounds {
            (Some(low), Some(high)) => {
                if low > high {
                    errors.push(format!("\"{}\" range bounds are reversed", spec.label));
                }
                if let Some(min) = spec.min_value {
                    if low < min {
                        errors.push(format!("\"{}\" can't be lower than {min}", spec.label));
                    }
                }
                if let Some(max) = spec.max_value {
                    if high > max {
                        errors.push(format!("\"{}\" can't be greater than {max}", spec.label));
                    }
                }
            }
            _ => {
                if spec.required {
                    errors.push(required_message(spec));
                }
            }
        }
        errors
    }

    fn filter(&self, _spec: &FieldSpec, value: &Value) -> Option<FilterFragment> {
        match value {
            Value::Array(items)
                if items.len() == 2 && items.iter().all(|v| v.as_f64().is_some()) =>
            {
                Some(FilterFragment {
                    compare: Compare::Between,
                    value: value.clone(),
                    cast: Cast::Numeric,
                })
            }
            _ => None,
        }
    }

    fn cast(&self) -> Cast {
        Cast::Numeric
    }

    fn settings(&self) -> &'static [&'static str] {
        &["required", "min_value", "max_value"]
    }

    fn filterable(&self) -> bool {
        true
    }
}

// --- select ---

/// Enumerated options. Values are option keys (inline options) or term ids
/// (relation-backed attributes).
pub struct SelectField;

impl FieldType for SelectField {
    fn tag(&self) -> &'static str {
        "select"
    }

    fn sanitize(&self, raw: &Value) -> Value {
        let items: Vec<Value> = match raw {
            Value::Array(items) => items.clone(),
            Value::Null => return Value::Null,
            scalar => vec![scalar.clone()],
        };
        let cleaned: Vec<Value> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => {
                    let trimmed = s.trim().to_string();
                    (!trimmed.is_empty()).then_some(Value::String(trimmed))
                }
                Value::Number(n) => Some(Value::Number(n)),
                _ => None,
            })
            .collect();
        if cleaned.is_empty() {
            Value::Null
        } else {
            Value::Array(cleaned)
        }
    }

    fn validate(&self, spec: &FieldSpec, value: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        let Value::Array(items) = value else {
            if spec.required {
                errors.push(required_message(spec));
            }
            return errors;
        };
        if !spec.multiple && items.len() > 1 {
            errors.push(format!("\"{}\" accepts a single value", spec.label));
        }
        if let Some(OptionsSource::Inline { options }) = &spec.options {
            for item in items {
                let key = match item {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => continue,
                };
                if !options.iter().any(|o| o.value == key) {
                    errors.push(format!("\"{key}\" is not a valid \"{}\" option", spec.label));
                }
            }
        }
        errors
    }

    fn filter(&self, _spec: &FieldSpec, value: &Value) -> Option<FilterFragment> {
        match value {
            Value::Array(items) if !items.is_empty() => Some(FilterFragment {
                compare: Compare::In,
                value: value.clone(),
                cast: Cast::Char,
            }),
            _ => None,
        }
    }

    fn settings(&self) -> &'static [&'static str] {
        &["required", "multiple", "options"]
    }

    fn filterable(&self) -> bool {
        true
    }
}

// --- checkbox ---

pub struct CheckboxField;

impl FieldType for CheckboxField {
    fn tag(&self) -> &'static str {
        "checkbox"
    }

    fn sanitize(&self, raw: &Value) -> Value {
        match raw {
            Value::Bool(b) => Value::Bool(*b),
            Value::Number(n) => Value::Bool(n.as_f64().unwrap_or(0.0) != 0.0),
            Value::String(s) => {
                Value::Bool(!s.is_empty() && s != "0" && s != "false")
            }
            _ => Value::Null,
        }
    }

    fn validate(&self, spec: &FieldSpec, value: &Value) -> Vec<String> {
        if spec.required && value.as_bool() != Some(true) {
            vec![required_message(spec)]
        } else {
            Vec::new()
        }
    }

    fn filter(&self, _spec: &FieldSpec, value: &Value) -> Option<FilterFragment> {
        // Only the checked state narrows results.
        (value.as_bool() == Some(true)).then_some(FilterFragment {
            compare: Compare::Equals,
            value: Value::Bool(true),
            cast: Cast::Char,
        })
    }

    fn filterable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldOption;
    use serde_json::json;

    fn spec(kind: &str) -> FieldSpec {
        FieldSpec::new("price", "Price", kind)
    }

    #[test]
    fn text_sanitize_idempotent() {
        let ty = TextField;
        for raw in [json!("  hello "), json!(42), json!(true), json!(null), json!([1])] {
            let once = ty.sanitize(&raw);
            assert_eq!(ty.sanitize(&once), once, "raw: {raw}");
        }
    }

    #[test]
    fn text_length_bounds() {
        let ty = TextField;
        let mut s = spec("text");
        s.min_length = Some(3);
        s.max_length = Some(5);
        assert!(ty.validate(&s, &json!("abcd")).is_empty());
        assert_eq!(ty.validate(&s, &json!("ab")).len(), 1);
        assert_eq!(ty.validate(&s, &json!("abcdef")).len(), 1);
    }

    #[test]
    fn text_required_only_when_empty() {
        let ty = TextField;
        let s = spec("text").required();
        assert_eq!(ty.validate(&s, &json!("")).len(), 1);
        assert_eq!(ty.validate(&s, &Value::Null).len(), 1);
        assert!(ty.validate(&s, &json!("ok")).is_empty());
    }

    #[test]
    fn number_sanitize_parses_strings_idempotently() {
        let ty = NumberField;
        assert_eq!(ty.sanitize(&json!(" 10 ")), json!(10.0));
        let once = ty.sanitize(&json!("10"));
        assert_eq!(ty.sanitize(&once), once);
        assert_eq!(ty.sanitize(&json!("ten")), Value::Null);
    }

    #[test]
    fn number_bounds() {
        let ty = NumberField;
        let mut s = spec("number");
        s.min_value = Some(10.0);
        s.max_value = Some(25.0);
        assert!(ty.validate(&s, &json!(15.0)).is_empty());
        assert_eq!(ty.validate(&s, &json!(5.0)).len(), 1);
        assert_eq!(ty.validate(&s, &json!(30.0)).len(), 1);
    }

    #[test]
    fn number_filter_is_numeric_equality() {
        let ty = NumberField;
        let fragment = ty.filter(&spec("number"), &json!(15.0)).unwrap();
        assert_eq!(fragment.compare, Compare::Equals);
        assert_eq!(fragment.cast, Cast::Numeric);
        assert!(ty.filter(&spec("number"), &Value::Null).is_none());
    }

    #[test]
    fn range_sanitize_shapes() {
        let ty = NumberRangeField;
        assert_eq!(ty.sanitize(&json!(["10", "25"])), json!([10.0, 25.0]));
        assert_eq!(ty.sanitize(&json!("10")), Value::Null);
        assert_eq!(ty.sanitize(&json!([1, 2, 3])), Value::Null);
        let once = ty.sanitize(&json!(["10", "25"]));
        assert_eq!(ty.sanitize(&once), once);
    }

    #[test]
    fn range_reversed_bounds_invalid() {
        let ty = NumberRangeField;
        let errors = ty.validate(&spec("number_range"), &json!([25.0, 10.0]));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn range_filter_between() {
        let ty = NumberRangeField;
        let fragment = ty
            .filter(&spec("number_range"), &json!([10.0, 25.0]))
            .unwrap();
        assert_eq!(fragment.compare, Compare::Between);
        assert!(ty
            .filter(&spec("number_range"), &json!([null, 25.0]))
            .is_none());
    }

    #[test]
    fn select_sanitize_wraps_scalars() {
        let ty = SelectField;
        assert_eq!(ty.sanitize(&json!("red")), json!(["red"]));
        assert_eq!(ty.sanitize(&json!(["red", " blue "])), json!(["red", "blue"]));
        assert_eq!(ty.sanitize(&json!("")), Value::Null);
        let once = ty.sanitize(&json!(5));
        assert_eq!(ty.sanitize(&once), once);
    }

    #[test]
    fn select_validates_inline_options() {
        let ty = SelectField;
        let mut s = spec("select");
        s.options = Some(OptionsSource::Inline {
            options: vec![FieldOption::new("red", "Red"), FieldOption::new("blue", "Blue")],
        });
        assert!(ty.validate(&s, &json!(["red"])).is_empty());
        assert_eq!(ty.validate(&s, &json!(["green"])).len(), 1);
    }

    #[test]
    fn select_single_rejects_multiple_values() {
        let ty = SelectField;
        let s = spec("select");
        assert_eq!(ty.validate(&s, &json!(["a", "b"])).len(), 1);
        let mut multi = spec("select");
        multi.multiple = true;
        assert!(multi.options.is_none());
        assert!(ty.validate(&multi, &json!(["a", "b"])).is_empty());
    }

    #[test]
    fn checkbox_truthiness() {
        let ty = CheckboxField;
        assert_eq!(ty.sanitize(&json!("1")), json!(true));
        assert_eq!(ty.sanitize(&json!("false")), json!(false));
        assert_eq!(ty.sanitize(&json!(0)), json!(false));
        let once = ty.sanitize(&json!("on"));
        assert_eq!(ty.sanitize(&once), once);
    }

    #[test]
    fn checkbox_filters_only_when_checked() {
        let ty = CheckboxField;
        assert!(ty.filter(&spec("checkbox"), &json!(true)).is_some());
        assert!(ty.filter(&spec("checkbox"), &json!(false)).is_none());
    }
}
