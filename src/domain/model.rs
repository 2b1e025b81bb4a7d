use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::utils::error::{EtlError, Result};

/// One catalogue record. Entries carry whatever fields the search endpoint
/// returns; only the portal reference lists are ever interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry {
    pub fields: Map<String, Value>,
}

impl Entry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Reference objects under a list-valued field. A missing field, a
    /// non-array value and non-object items all yield nothing.
    pub fn references<'a>(
        &'a self,
        field: &str,
    ) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }
}

/// A normalized dataset: one named collection of entries. This is the
/// document shape the serve endpoint and the aggregation step both consume.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub key: String,
    pub entries: Vec<Entry>,
}

impl Dataset {
    pub fn new(key: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            key: key.into(),
            entries,
        }
    }

    /// Select the collection stored under `key` in a parsed document.
    pub fn from_document(key: &str, document: &Value) -> Result<Self> {
        let collection = document.get(key).ok_or_else(|| {
            let available = document
                .as_object()
                .map(|obj| obj.keys().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            EtlError::ProcessingError {
                message: format!("dataset key '{}' not found (available: {})", key, available),
            }
        })?;

        let items = collection.as_array().ok_or_else(|| EtlError::ProcessingError {
            message: format!("dataset key '{}' does not hold an entry list", key),
        })?;

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(fields) => entries.push(Entry::new(fields.clone())),
                other => {
                    tracing::warn!(
                        "skipping non-object entry under '{}' ({})",
                        key,
                        json_kind(other)
                    );
                }
            }
        }

        Ok(Self::new(key, entries))
    }

    /// Render back to the single-document form `{"<key>": [entries]}`.
    pub fn to_document(&self) -> Value {
        let items = self
            .entries
            .iter()
            .map(|entry| Value::Object(entry.fields.clone()))
            .collect();
        let mut document = Map::new();
        document.insert(self.key.clone(), Value::Array(items));
        Value::Object(document)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deduplicated portals keyed by name. The map keeps iteration order stable,
/// so repeated runs over the same input serialize identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalAggregate {
    portals: BTreeMap<String, Value>,
}

impl PortalAggregate {
    /// Fold one reference object into the aggregate. References without a
    /// `name` are dropped. An `id` overwrites whatever was stored for the
    /// name before; a bare name never clobbers an id seen earlier.
    pub fn record(&mut self, reference: &Map<String, Value>) {
        let Some(name) = reference.get("name").and_then(Value::as_str) else {
            return;
        };
        match reference.get("id") {
            Some(id) => {
                self.portals.insert(name.to_string(), id.clone());
            }
            None => {
                self.portals.entry(name.to_string()).or_insert(Value::Null);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.portals.iter()
    }

    /// Sorted list of names, the first output variant.
    pub fn names(&self) -> Value {
        Value::Array(self.portals.keys().cloned().map(Value::String).collect())
    }

    /// Name-to-id mapping, the second output variant.
    pub fn mapping(&self) -> Value {
        Value::Object(
            self.portals
                .iter()
                .map(|(name, id)| (name.clone(), id.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported output format: {}", other)),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
