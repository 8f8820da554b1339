//! Error types for the conflict crate

use thiserror::Error;

/// Errors that can occur while surfacing conflicts
#[derive(Debug, Error)]
pub enum ConflictError {
    /// The notification port rejected a view change
    #[error("failed to show result view: {0}")]
    Notification(#[source] anyhow::Error),
}
