//! Conflict detection logic
//!
//! Before a copy overwrites an existing destination, the local meta's
//! `synced` timestamp is compared with the destination's modification time.
//! A nonzero `synced` that no longer matches means the destination was
//! edited after the last confirmed sync of this note.

use serde::Serialize;
use tracing::debug;
use vaultsync_core::domain::NoteRef;

/// Both sides changed since the last confirmed sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivergentEdit {
    pub note: NoteRef,
    /// `synced` value from the local meta record
    pub synced_ms: i64,
    /// Current modification time of the copy that would be overwritten
    pub destination_mtime_ms: i64,
}

/// Result of a conflict check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionResult {
    /// Safe to overwrite the destination
    NoConflict,
    /// Destination changed independently; do not touch either side
    Conflicted(DivergentEdit),
}

impl DetectionResult {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DetectionResult::Conflicted(_))
    }
}

/// Detects divergent edits
pub struct ConflictDetector;

impl ConflictDetector {
    /// Checks whether overwriting the destination would lose an edit.
    ///
    /// A conflict exists when:
    /// 1. the destination exists (`destination_mtime_ms` is `Some`), AND
    /// 2. the local meta carries a nonzero `synced` value, AND
    /// 3. that value differs from the destination's modification time.
    ///
    /// An unset `synced` means the note has never been synced, so the copy
    /// proceeds.
    pub fn check(
        note: &NoteRef,
        local_synced_ms: i64,
        destination_mtime_ms: Option<i64>,
    ) -> DetectionResult {
        let Some(destination_mtime_ms) = destination_mtime_ms else {
            return DetectionResult::NoConflict;
        };

        if local_synced_ms == 0 {
            debug!(note = %note, "No synced timestamp, first sync of this note");
            return DetectionResult::NoConflict;
        }

        if local_synced_ms == destination_mtime_ms {
            return DetectionResult::NoConflict;
        }

        DetectionResult::Conflicted(DivergentEdit {
            note: note.clone(),
            synced_ms: local_synced_ms,
            destination_mtime_ms,
        })
    }
}
