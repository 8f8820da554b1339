//! VaultSync Sync - vault/mirror reconciliation engine
//!
//! Provides:
//! - Per-note push/pull decisions from modification times
//! - Guarded copies with single-slot retention of overwritten files
//! - Mobile event replay (notebook creation, note moves)
//! - Search index export for the companion app
//!
//! ## Modules
//!
//! - [`engine`] - `SyncOrchestrator`, one full pass over the enrolled notebooks
//! - [`planner`] - Candidate listing and the per-note decision
//! - [`executor`] - Conflict guard, retention and copy of one note
//! - [`inbox`] - `.events` command files from the companion app
//! - [`exporter`] - Gzipped inverted index of synced notes
//! - [`propagate`] - Immediate mirror updates for local renames and moves
//! - [`filesystem`] - Retention, mtime-preserving copies, directory merges
//! - [`hasher`] - Provider-compatible block content hash
//! - [`path_lock`] - Per-path advisory locks shared with viewers
//! - [`scheduler`] - Periodic passes and "sync now" requests

pub mod engine;
pub mod executor;
pub mod exporter;
pub mod filesystem;
pub mod hasher;
pub mod inbox;
pub mod path_lock;
pub mod planner;
pub mod propagate;
pub mod scheduler;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use engine::SyncOrchestrator;
pub use path_lock::{PathLockGuard, PathLocks};
pub use exporter::{ExportSummary, SearchIndexExporter};
pub use propagate::{MirrorPropagator, Propagation};
pub use scheduler::{PassGate, PassPermit, SyncScheduler};

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error occurred on a specific path
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A move event's content hash does not match the local note
    #[error("Content hash mismatch for {path}: expected {expected}, found {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// A move or rename target already exists
    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// An event file could not be understood
    #[error("Invalid event {file}: {reason}")]
    InvalidEvent { file: PathBuf, reason: String },

    /// A meta record exists but cannot be parsed
    #[error("Unreadable meta record {path}: {reason}")]
    InvalidMeta { path: PathBuf, reason: String },

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// A domain-level error propagated from vaultsync-core
    #[error("Domain error: {0}")]
    DomainError(#[from] vaultsync_core::domain::DomainError),
}

impl SyncError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(e: tokio::task::JoinError) -> Self {
        SyncError::Task(e.to_string())
    }
}
