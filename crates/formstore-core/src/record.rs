use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Upper bound for a storage identifier, counted in characters.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Identifier used when a submission does not name its storage.
pub const UNDEFINED_IDENTIFIER: &str = "__undefined__";

/// Submitted field name → value, in submission order.
pub type Properties = IndexMap<String, PropertyValue>;

/// Reference to a binary attachment kept by a resource store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: Uuid,
    pub filename: String,
    pub media_type: String,
    pub size: u64,
}

/// A single submitted value.
///
/// Stored as `{"__value": ...}` or `{"__resource": {...}}`. Every value is
/// wrapped, so submitted JSON shaped like a resource stays a plain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    #[serde(rename = "__value")]
    Value(serde_json::Value),
    #[serde(rename = "__resource")]
    Resource(ResourceRef),
}

impl PropertyValue {
    pub fn resource(resource: ResourceRef) -> Self {
        Self::Resource(resource)
    }

    pub fn as_resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Resource(resource) => Some(resource),
            Self::Value(_) => None,
        }
    }

    /// Human readable form used for tables and exports.
    pub fn display_value(&self) -> String {
        match self {
            Self::Resource(resource) => resource.filename.clone(),
            Self::Value(value) => display_json(value),
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Value(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Value(serde_json::Value::String(value))
    }
}

impl From<ResourceRef> for PropertyValue {
    fn from(resource: ResourceRef) -> Self {
        Self::Resource(resource)
    }
}

fn display_json(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Multi-select fields
        Value::Array(items) => items
            .iter()
            .map(display_json)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// One persisted form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub id: String,
    pub identifier: String,
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
}

impl StorageRecord {
    pub fn new(identifier: impl Into<String>, properties: Properties) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            identifier,
            properties,
            timestamp: Utc::now(),
        })
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// All attachments referenced by this record.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceRef> {
        self.properties.values().filter_map(PropertyValue::as_resource)
    }
}

/// Check the identifier is non-empty and within [`MAX_IDENTIFIER_LENGTH`].
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(Error::InvalidIdentifier(
            "identifier must not be empty".to_string(),
        ));
    }

    let length = identifier.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(Error::InvalidIdentifier(format!(
            "identifier is {} characters long, maximum is {}",
            length, MAX_IDENTIFIER_LENGTH
        )));
    }

    Ok(())
}
