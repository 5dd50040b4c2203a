use crate::error::FeatureManagerError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The state attached to one feature id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagState {
    /// `"feature": true`
    Toggle(bool),
    /// `"feature": { "enabled": false, "option1": "x" }`
    Options(FeatureOptions),
}

/// A flag record: enablement switches plus arbitrary option fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureOptions {
    #[serde(
        default,
        deserialize_with = "switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub enabled: Option<bool>,
    #[serde(
        default,
        deserialize_with = "switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub disabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A switch may be left out, but when present it must be a boolean.
fn switch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    bool::deserialize(deserializer).map(Some)
}

/// Mapping from feature id to its flag state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureDocument {
    flags: HashMap<String, FlagState>,
}

impl FeatureDocument {
    pub fn get(&self, feature_id: &str) -> Option<&FlagState> {
        self.flags.get(feature_id)
    }

    pub fn contains(&self, feature_id: &str) -> bool {
        self.flags.contains_key(feature_id)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }
}

impl FromIterator<(String, FlagState)> for FeatureDocument {
    fn from_iter<I: IntoIterator<Item = (String, FlagState)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

/// Parse raw text into a feature document.
///
/// Either the whole document parses or an error is returned.
pub fn parse_document(raw: &str) -> Result<FeatureDocument, FeatureManagerError> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(FeatureManagerError::MalformedDocument(format!(
            "expected a JSON object at the top level, found {}",
            json_type(&value)
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
