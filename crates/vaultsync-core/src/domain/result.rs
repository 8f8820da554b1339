//! Sync pass outcome types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::newtypes::NoteRef;

/// Environment condition that stops a pass before it touches any file
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncBlocked {
    #[error("Mirror folder is not configured. Set mirror.root to the sync client's app folder.")]
    MirrorNotFound,

    #[error("Mirror folder {0} does not exist. Create it or point mirror.root at an existing folder.")]
    MirrorMissing(String),

    #[error("The vault is inside the mirror folder and needs no separate sync.")]
    VaultInsideMirror,

    #[error("Sync is currently disabled. Doing nothing.")]
    Disabled,

    #[error("No notebooks selected for syncing. Enroll notebooks with `vaultsync notebooks enroll`.")]
    NothingEnrolled,

    #[error("A sync pass is already running.")]
    AlreadyRunning,
}

/// Phase of a sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    #[default]
    Idle,
    Validating,
    DrainingEvents,
    ReconcilingNotebooks,
    Exporting,
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PassState::Idle => "idle",
            PassState::Validating => "validating",
            PassState::DrainingEvents => "draining_events",
            PassState::ReconcilingNotebooks => "reconciling_notebooks",
            PassState::Exporting => "exporting",
        };
        write!(f, "{}", s)
    }
}

/// Summary of one sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Notes already identical on both sides
    pub in_sync: u32,
    /// Notes copied local → remote
    pub pushed: u32,
    /// Notes copied remote → local
    pub pulled: u32,
    /// Notes moved by events
    pub moved: u32,
    /// Notes skipped by the conflict guard
    pub conflicts: Vec<NoteRef>,
    /// Local notes overwritten by a pull
    pub updated: Vec<NoteRef>,
    /// Per-note failures, one line each
    pub errors: Vec<String>,
    /// Why the pass stopped early, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<SyncBlocked>,
    /// Wall time of the pass in milliseconds
    pub duration_ms: u64,
}

impl SyncResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result for a pass stopped by an entry guard
    pub fn blocked(reason: SyncBlocked) -> Self {
        Self {
            blocked: Some(reason),
            ..Self::default()
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    /// Total notes copied in either direction
    pub fn copied(&self) -> u32 {
        self.pushed + self.pulled
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        if let Some(reason) = &self.blocked {
            return reason.to_string();
        }
        format!(
            "{} in sync, {} pushed, {} pulled, {} moved, {} conflicts, {} errors",
            self.in_sync,
            self.pushed,
            self.pulled,
            self.moved,
            self.conflicts.len(),
            self.errors.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_summary() {
        let mut result = SyncResult::new();
        result.pushed = 2;
        result.pulled = 1;
        result.in_sync = 4;
        assert_eq!(result.copied(), 3);
        assert!(!result.is_blocked());
        assert_eq!(
            result.summary(),
            "4 in sync, 2 pushed, 1 pulled, 0 moved, 0 conflicts, 0 errors"
        );
    }

    #[test]
    fn test_blocked_summary() {
        let result = SyncResult::blocked(SyncBlocked::Disabled);
        assert!(result.is_blocked());
        assert_eq!(result.summary(), "Sync is currently disabled. Doing nothing.");
        assert_eq!(result.copied(), 0);
    }

    #[test]
    fn test_pass_state_display() {
        assert_eq!(PassState::default(), PassState::Idle);
        assert_eq!(PassState::DrainingEvents.to_string(), "draining_events");
    }

    #[test]
    fn test_result_serializes_without_blocked() {
        let json = serde_json::to_value(SyncResult::new()).unwrap();
        assert!(json.get("blocked").is_none());
        assert_eq!(json["pushed"], 0);
    }
}
