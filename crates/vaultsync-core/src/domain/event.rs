//! Mobile event documents
//!
//! Event files are small JSON commands dropped into the mirror's `.events`
//! folder by a companion client. The `op` field selects the variant.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// File extension recognized in the events folder (case-insensitive)
pub const EVENT_FILE_EXTENSION: &str = "json";

/// A command read from the events folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum SyncEvent {
    /// Create a local notebook and enroll it in sync
    #[serde(rename = "newnotebook")]
    NewNotebook {
        #[serde(default)]
        name: String,
    },
    /// Replay a note move the companion client already made on the mirror
    Move(MoveEvent),
}

impl SyncEvent {
    /// Parse an event document.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidDocument` for malformed JSON or an unknown
    /// `op`.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        serde_json::from_str(text).map_err(|e| DomainError::InvalidDocument(e.to_string()))
    }

    /// The `op` token of this event
    pub fn op(&self) -> &'static str {
        match self {
            SyncEvent::NewNotebook { .. } => "newnotebook",
            SyncEvent::Move(_) => "move",
        }
    }
}

/// Payload of a `move` event. Paths are vault-relative with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvent {
    #[serde(default)]
    pub source_note: String,
    #[serde(default)]
    pub dest_note: String,
    #[serde(default)]
    pub source_meta: String,
    #[serde(default)]
    pub dest_meta: String,
    #[serde(default)]
    pub content_hash: String,
    /// Replacement destination file name chosen to avoid a collision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autorenamed: Option<String>,
}

impl MoveEvent {
    /// Auto-rename suffix, ignoring an empty string
    pub fn autorenamed(&self) -> Option<&str> {
        self.autorenamed.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Source meta path, ignoring an empty string
    pub fn source_meta(&self) -> Option<&str> {
        Some(self.source_meta.as_str()).filter(|s| !s.trim().is_empty())
    }

    /// Destination meta path, ignoring an empty string
    pub fn dest_meta(&self) -> Option<&str> {
        Some(self.dest_meta.as_str()).filter(|s| !s.trim().is_empty())
    }
}
