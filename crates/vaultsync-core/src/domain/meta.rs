//! Note meta documents
//!
//! A meta record is an open JSON object. The engine reads `synced`, `title`,
//! `tags` and `created`, writes only `synced`, and keeps every other field
//! untouched.

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::DomainError;

/// Sidecar meta record of a note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteMeta {
    fields: Map<String, Value>,
}

impl NoteMeta {
    /// Field holding the last confirmed sync time (epoch ms, string-encoded)
    pub const SYNCED: &'static str = "synced";

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a meta document. Empty or whitespace-only input yields an empty
    /// record.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidDocument` if the text is not a JSON object.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(DomainError::InvalidDocument(format!(
                "meta record is not an object: {other}"
            ))),
            Err(e) => Err(DomainError::InvalidDocument(e.to_string())),
        }
    }

    /// Render the document with 4-space indentation.
    pub fn to_pretty_string(&self) -> String {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        // Serializing a map of JSON values into memory cannot fail.
        if self.fields.serialize(&mut ser).is_err() {
            return "{}".to_string();
        }
        String::from_utf8(buf).unwrap_or_else(|_| "{}".to_string())
    }

    /// Last sync time in epoch milliseconds; 0 when unset or unreadable.
    pub fn synced(&self) -> i64 {
        self.millis_field(Self::SYNCED)
    }

    pub fn set_synced(&mut self, millis: i64) {
        self.fields
            .insert(Self::SYNCED.to_string(), Value::String(millis.to_string()));
    }

    pub fn title(&self) -> String {
        self.fields
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Tag identifiers attached to the note
    pub fn tags(&self) -> Vec<String> {
        match self.fields.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Creation time in epoch milliseconds; 0 when unset.
    pub fn created(&self) -> i64 {
        self.millis_field("created")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    fn millis_field(&self, key: &str) -> i64 {
        match self.fields.get(key) {
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            _ => 0,
        }
    }
}
