//! Tagged mock value and its JSON serializer.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A synthesized mock value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MockValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Sequence(Vec<MockValue>),
    Object(BTreeMap<String, MockValue>),
}

impl MockValue {
    pub fn empty_object() -> Self {
        MockValue::Object(BTreeMap::new())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MockValue::Null => "null",
            MockValue::Bool(_) => "boolean",
            MockValue::Number(_) => "number",
            MockValue::String(_) => "string",
            MockValue::Sequence(_) => "array",
            MockValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MockValue::Null)
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, MockValue>> {
        match self {
            MockValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[MockValue]> {
        match self {
            MockValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MockValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MockValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Look up a key of an object value.
    pub fn get(&self, key: &str) -> Option<&MockValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        // Serializing into a String cannot fail: keys are strings and
        // non-finite numbers are written as null.
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }

    pub fn to_json_string_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "null".to_string())
    }
}

impl Serialize for MockValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MockValue::Null => serializer.serialize_unit(),
            MockValue::Bool(b) => serializer.serialize_bool(*b),
            MockValue::Number(n) => {
                if !n.is_finite() {
                    serializer.serialize_unit()
                } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    // Integral values keep their integer form (`0`, not `0.0`).
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            MockValue::String(s) => serializer.serialize_str(s),
            MockValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            MockValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for MockValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(MockValue::from)
    }
}

impl From<serde_json::Value> for MockValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MockValue::Null,
            serde_json::Value::Bool(b) => MockValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(MockValue::Number).unwrap_or_default(),
            serde_json::Value::String(s) => MockValue::String(s),
            serde_json::Value::Array(items) => {
                MockValue::Sequence(items.into_iter().map(MockValue::from).collect())
            }
            serde_json::Value::Object(map) => MockValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, MockValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&MockValue> for serde_json::Value {
    fn from(value: &MockValue) -> Self {
        serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
    }
}

impl From<bool> for MockValue {
    fn from(b: bool) -> Self {
        MockValue::Bool(b)
    }
}

impl From<f64> for MockValue {
    fn from(n: f64) -> Self {
        MockValue::Number(n)
    }
}

impl From<&str> for MockValue {
    fn from(s: &str) -> Self {
        MockValue::String(s.to_string())
    }
}

impl From<String> for MockValue {
    fn from(s: String) -> Self {
        MockValue::String(s)
    }
}

impl fmt::Display for MockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}
