//! Opaque submodel document.
//!
//! Source resources are passed through to the destination verbatim. Only
//! two fields are ever inspected:
//! - `id`: used as the resource label and as the registered submodel id
//! - `dataSourceItems`: nested objects published individually in item mode

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label used when a resource carries no string `id`.
pub const UNKNOWN_LABEL: &str = "<unknown>";

const ID_FIELD: &str = "id";
const DATA_SOURCE_ITEMS_FIELD: &str = "dataSourceItems";

/// A submodel resource as returned by the source API.
///
/// Key order of the source JSON is preserved on re-serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmodelDocument(Map<String, Value>);

impl SubmodelDocument {
    /// Wrap a decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DocumentError::NotAnObject(json_kind(&other))),
        }
    }

    /// The resource's own `id`, if present and a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// The `id`, or [`UNKNOWN_LABEL`] when absent.
    #[must_use]
    pub fn label(&self) -> &str {
        self.id().unwrap_or(UNKNOWN_LABEL)
    }

    /// Nested data-source items. Empty when the field is missing or not a list.
    #[must_use]
    pub fn data_source_items(&self) -> &[Value] {
        self.0
            .get(DATA_SOURCE_ITEMS_FIELD)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Payloads to publish in item mode.
    ///
    /// Falls back to the whole document when it has no data-source items.
    #[must_use]
    pub fn publish_units(&self) -> Vec<Value> {
        let items = self.data_source_items();
        if items.is_empty() {
            vec![self.to_value()]
        } else {
            items.to_vec()
        }
    }

    /// Clone into a plain JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl TryFrom<Value> for SubmodelDocument {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Label of an arbitrary publish payload (its `id`, or [`UNKNOWN_LABEL`]).
#[must_use]
pub fn label_of(value: &Value) -> &str {
    value
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_LABEL)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors that can occur when wrapping a source resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The source returned something other than a JSON object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}
