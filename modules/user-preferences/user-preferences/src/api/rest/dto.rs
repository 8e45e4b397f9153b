use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use user_preferences_sdk::{FieldViolation, PreferenceEntry, PreferenceKey, PreferenceValue};
use utoipa::ToSchema;

use crate::domain::registry::{Domain, PreferenceSpec};

/// JSON form of a typed value.
#[must_use]
pub fn value_to_json(value: &PreferenceValue) -> Value {
    match value {
        PreferenceValue::Null => Value::Null,
        PreferenceValue::Bool(b) => Value::Bool(*b),
        PreferenceValue::Int(n) => Value::from(*n),
        PreferenceValue::Choice(code) => Value::String(code.to_string()),
    }
}

/// Typed value from JSON. Only the shape is checked here; domain rules are
/// left to the registry.
///
/// # Errors
/// Arrays, objects and non-integral numbers.
pub fn value_from_json(field: &str, json: Value) -> Result<PreferenceValue, FieldViolation> {
    match json {
        Value::Null => Ok(PreferenceValue::Null),
        Value::Bool(b) => Ok(PreferenceValue::Bool(b)),
        Value::Number(n) => n
            .as_i64()
            .map(PreferenceValue::Int)
            .ok_or_else(|| FieldViolation::new(field, format!("expected an integer, got {n}"))),
        Value::String(s) => Ok(PreferenceValue::Choice(Cow::Owned(s))),
        Value::Array(_) | Value::Object(_) => Err(FieldViolation::new(
            field,
            "expected a boolean, integer, string or null",
        )),
    }
}

/// Flat `{key: value}` object covering every registered key.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PreferencesDto(pub Map<String, Value>);

impl From<Vec<PreferenceEntry>> for PreferencesDto {
    fn from(entries: Vec<PreferenceEntry>) -> Self {
        Self(
            entries
                .iter()
                .map(|entry| (entry.key.as_str().to_owned(), value_to_json(&entry.value)))
                .collect(),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreferenceEntryDto {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

impl From<PreferenceEntry> for PreferenceEntryDto {
    fn from(entry: PreferenceEntry) -> Self {
        Self {
            key: entry.key.as_str().to_owned(),
            value: value_to_json(&entry.value),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SetPreferenceRequest {
    /// Boolean, integer, string code or null depending on the key.
    #[schema(value_type = Object)]
    pub value: Value,
}

/// Converts a partial `{key: value}` body into entries, reporting every
/// unknown key and malformed value at once.
///
/// # Errors
/// One violation per unknown key or malformed value.
pub fn patch_to_entries(
    body: Map<String, Value>,
) -> Result<Vec<PreferenceEntry>, Vec<FieldViolation>> {
    let mut entries = Vec::with_capacity(body.len());
    let mut violations = Vec::new();

    for (name, json) in body {
        let Ok(key) = name.parse::<PreferenceKey>() else {
            violations.push(FieldViolation::new(name, "unknown preference key"));
            continue;
        };
        match value_from_json(&name, json) {
            Ok(value) => entries.push(PreferenceEntry::new(key, value)),
            Err(v) => violations.push(v),
        }
    }

    if violations.is_empty() {
        Ok(entries)
    } else {
        Err(violations)
    }
}

/// Registry entry as shown to clients building a preference form.
#[derive(Debug, Serialize, ToSchema)]
pub struct PreferenceDescriptorDto {
    pub key: String,
    /// `boolean`, `integer` or `choice`
    pub kind: String,
    pub nullable: bool,
    #[schema(value_type = Object)]
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl From<&PreferenceSpec> for PreferenceDescriptorDto {
    fn from(spec: &PreferenceSpec) -> Self {
        let (min, max, options) = match spec.domain {
            Domain::Boolean => (None, None, None),
            Domain::Integer { min, max, .. } => (Some(min), Some(max), None),
            Domain::Choice { options, .. } => (
                None,
                None,
                Some(options.iter().map(|&o| o.to_owned()).collect()),
            ),
        };

        Self {
            key: spec.key.as_str().to_owned(),
            kind: spec.domain.kind().to_owned(),
            nullable: spec.domain.is_nullable(),
            default: value_to_json(&spec.default),
            min,
            max,
            options,
        }
    }
}
