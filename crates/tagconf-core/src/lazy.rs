//! Deferred-decode handles over parsed document nodes.
//!
//! A [`LazyValue`] wraps one node of a parsed YAML or JSON document and only
//! coerces it into a Rust type once the target field's type is known.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::BoxError;

/// String-keyed, insertion-ordered mapping of source keys to lazy values.
pub type SourceMap<L> = IndexMap<String, L>;

/// A node of a parsed document whose conversion is deferred.
pub trait LazyValue: Sized {
    /// Error produced when the node cannot be coerced.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decodes the node into `T`.
    fn decode<T: DeserializeOwned>(&self) -> Result<T, Self::Error>;

    /// Decodes a mapping node into lazy children; `None` for any other node.
    fn decode_map(&self) -> Option<SourceMap<Self>>;

    /// Decodes a sequence node into lazy items; `None` for any other node.
    fn decode_seq(&self) -> Option<Vec<Self>>;

    /// Returns `true` for an explicit null, which counts as an absent key.
    fn is_null(&self) -> bool;

    /// Name of the node's structural type, for messages.
    fn type_name(&self) -> &'static str;

    /// Parses a relaxed YAML literal into a node of this backend.
    fn from_literal(literal: &str) -> Result<Self, BoxError>;
}

/// Lazy value over a `serde_json` node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonValue(pub serde_json::Value);

impl From<serde_json::Value> for JsonValue {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl JsonValue {
    /// Builds a source map from a top-level JSON object.
    pub fn source_map(value: serde_json::Value) -> Option<SourceMap<Self>> {
        match value {
            serde_json::Value::Object(map) => {
                Some(map.into_iter().map(|(k, v)| (k, Self(v))).collect())
            }
            _ => None,
        }
    }
}

impl LazyValue for JsonValue {
    type Error = serde_json::Error;

    fn decode<T: DeserializeOwned>(&self) -> Result<T, Self::Error> {
        T::deserialize(&self.0)
    }

    fn decode_map(&self) -> Option<SourceMap<Self>> {
        self.0.as_object().map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), Self(v.clone())))
                .collect()
        })
    }

    fn decode_seq(&self) -> Option<Vec<Self>> {
        self.0
            .as_array()
            .map(|items| items.iter().cloned().map(Self).collect())
    }

    fn is_null(&self) -> bool {
        self.0.is_null()
    }

    fn type_name(&self) -> &'static str {
        match &self.0 {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "bool",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "sequence",
            serde_json::Value::Object(_) => "mapping",
        }
    }

    fn from_literal(literal: &str) -> Result<Self, BoxError> {
        let node: serde_yaml::Value = serde_yaml::from_str(literal)?;
        Ok(Self(serde_json::to_value(node)?))
    }
}

/// Lazy value over a `serde_yaml` node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YamlValue(pub serde_yaml::Value);

impl From<serde_yaml::Value> for YamlValue {
    fn from(value: serde_yaml::Value) -> Self {
        Self(value)
    }
}

impl YamlValue {
    /// Builds a source map from a top-level YAML mapping.
    pub fn source_map(value: serde_yaml::Value) -> Option<SourceMap<Self>> {
        match value {
            serde_yaml::Value::Mapping(map) => Some(
                map.into_iter()
                    .filter_map(|(k, v)| yaml_key(&k).map(|k| (k, Self(v))))
                    .collect(),
            ),
            _ => None,
        }
    }
}

// Only scalar keys can address a record field.
fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => {
            tracing::trace!(?key, "ignoring non-scalar mapping key");
            None
        }
    }
}

impl LazyValue for YamlValue {
    type Error = serde_yaml::Error;

    fn decode<T: DeserializeOwned>(&self) -> Result<T, Self::Error> {
        serde_yaml::from_value(self.0.clone())
    }

    fn decode_map(&self) -> Option<SourceMap<Self>> {
        self.0.as_mapping().map(|map| {
            map.iter()
                .filter_map(|(k, v)| yaml_key(k).map(|k| (k, Self(v.clone()))))
                .collect()
        })
    }

    fn decode_seq(&self) -> Option<Vec<Self>> {
        self.0
            .as_sequence()
            .map(|items| items.iter().cloned().map(Self).collect())
    }

    fn is_null(&self) -> bool {
        self.0.is_null()
    }

    fn type_name(&self) -> &'static str {
        match &self.0 {
            serde_yaml::Value::Null => "null",
            serde_yaml::Value::Bool(_) => "bool",
            serde_yaml::Value::Number(_) => "number",
            serde_yaml::Value::String(_) => "string",
            serde_yaml::Value::Sequence(_) => "sequence",
            serde_yaml::Value::Mapping(_) => "mapping",
            serde_yaml::Value::Tagged(_) => "tagged value",
        }
    }

    fn from_literal(literal: &str) -> Result<Self, BoxError> {
        Ok(Self(serde_yaml::from_str(literal)?))
    }
}
