//! Reason codes for skipped work
//!
//! Provides structured codes for categorizing why a note copy or an event
//! was not applied. Attached to tracing events and per-note error lines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured reason codes for skipped notes and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Both sides changed since the last confirmed sync
    Conflict,
    /// A move event's content hash does not match the local note
    HashMismatch,
    /// A move target already exists and would be overwritten
    DestinationExists,
    /// The source of a move is gone
    SourceMissing,
    /// An event file could not be parsed or named an unknown operation
    InvalidEvent,
    /// A meta record exists but is not valid JSON
    InvalidMeta,
    /// A file operation failed
    IoFailure,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReasonCode::Conflict => "conflict",
            ReasonCode::HashMismatch => "hash_mismatch",
            ReasonCode::DestinationExists => "destination_exists",
            ReasonCode::SourceMissing => "source_missing",
            ReasonCode::InvalidEvent => "invalid_event",
            ReasonCode::InvalidMeta => "invalid_meta",
            ReasonCode::IoFailure => "io_failure",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_code_display() {
        assert_eq!(ReasonCode::Conflict.to_string(), "conflict");
        assert_eq!(ReasonCode::HashMismatch.to_string(), "hash_mismatch");
        assert_eq!(
            ReasonCode::DestinationExists.to_string(),
            "destination_exists"
        );
        assert_eq!(ReasonCode::IoFailure.to_string(), "io_failure");
    }

    #[test]
    fn reason_code_serialization() {
        let code = ReasonCode::InvalidEvent;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"invalid_event\"");

        let deserialized: ReasonCode = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, code);
    }
}
