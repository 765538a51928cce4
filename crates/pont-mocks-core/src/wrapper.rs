//! Response wrapper templates.
//!
//! A wrapper is JSON text with a `{response}` placeholder, for example
//! `{"code": 0, "data": {response}, "message": ""}`. It is parsed once into a
//! value tree holding a slot where the placeholder was.

use crate::value::MockValue;
use thiserror::Error;

/// Placeholder replaced by the synthesized response.
pub const RESPONSE_PLACEHOLDER: &str = "{response}";

/// Wrapper used when a project does not configure one.
pub const DEFAULT_WRAPPER: &str = r#"{"code": 0, "data": {response}, "message": ""}"#;

/// Marker string standing in for the response inside the parsed template.
const SLOT: &str = "\u{1}pont-mocks:response\u{1}";

#[derive(Debug, Error, PartialEq)]
pub enum WrapperError {
    #[error("Wrapper template must contain the {{response}} placeholder")]
    MissingPlaceholder,
    #[error("Wrapper template is not valid JSON once {{response}} is substituted: {0}")]
    InvalidTemplate(String),
}

/// A parsed response wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapper {
    shape: MockValue,
}

impl Wrapper {
    pub fn parse(template: &str) -> Result<Self, WrapperError> {
        if !template.contains(RESPONSE_PLACEHOLDER) {
            return Err(WrapperError::MissingPlaceholder);
        }

        let slot_json = serde_json::to_string(SLOT)
            .map_err(|e| WrapperError::InvalidTemplate(e.to_string()))?;
        // Only the first placeholder is substituted.
        let text = template.replacen(RESPONSE_PLACEHOLDER, &slot_json, 1);
        let parsed: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| WrapperError::InvalidTemplate(e.to_string()))?;

        Ok(Self {
            shape: MockValue::from(parsed),
        })
    }

    /// The wrapper that returns the response unchanged.
    pub fn identity() -> Self {
        Self {
            shape: MockValue::String(SLOT.to_string()),
        }
    }

    /// The parsed template. Use [`Wrapper::is_slot`] to find the response position.
    pub fn shape(&self) -> &MockValue {
        &self.shape
    }

    /// True for the node standing in for the response.
    pub fn is_slot(value: &MockValue) -> bool {
        value.as_str() == Some(SLOT)
    }

    /// Wrap a synthesized response.
    pub fn apply(&self, response: MockValue) -> MockValue {
        let mut response = Some(response);
        fill_slot(&self.shape, &mut response)
    }
}

impl Default for Wrapper {
    fn default() -> Self {
        Self::identity()
    }
}

fn fill_slot(node: &MockValue, response: &mut Option<MockValue>) -> MockValue {
    if Wrapper::is_slot(node) {
        return response.take().unwrap_or_default();
    }

    match node {
        MockValue::Sequence(items) => {
            MockValue::Sequence(items.iter().map(|item| fill_slot(item, response)).collect())
        }
        MockValue::Object(map) => MockValue::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), fill_slot(value, response)))
                .collect(),
        ),
        other => other.clone(),
    }
}
