//! Notification service port (driven/secondary port)
//!
//! This module defines the interface through which the sync engine tells
//! the host UI about vault changes and transient result views.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because notification delivery is adapter-specific.
//! - Notifications are fire-and-forget. A failed delivery is logged by the
//!   caller and never aborts a pass.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::ResultSet;

// ============================================================================
// Vault notifications
// ============================================================================

/// A change the UI should react to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VaultNotification {
    /// A notebook directory was created
    NotebookCreated { notebook: String },
    /// The set of notebooks changed
    NotebookListChanged,
    /// A notebook's contents changed and its listing should be reloaded
    NotebookRefreshed { notebook: String },
    /// A note file moved between notebooks
    NoteMoved { from: PathBuf, to: PathBuf },
}

impl std::fmt::Display for VaultNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultNotification::NotebookCreated { notebook } => {
                write!(f, "notebook created: {}", notebook)
            }
            VaultNotification::NotebookListChanged => write!(f, "notebook list changed"),
            VaultNotification::NotebookRefreshed { notebook } => {
                write!(f, "notebook refreshed: {}", notebook)
            }
            VaultNotification::NoteMoved { from, to } => {
                write!(f, "note moved: {} -> {}", from.display(), to.display())
            }
        }
    }
}

// ============================================================================
// Result views
// ============================================================================

/// What the note list should display after a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultView {
    /// A transient Conflict or Updated listing
    Show(ResultSet),
    /// Back to the user's default notebook
    DefaultNotebook,
}

// ============================================================================
// INotificationService trait
// ============================================================================

/// Port trait for UI-facing notifications
///
/// ## Implementation Notes
///
/// - `notify` posts a vault change.
/// - `show_result_view` switches the note list to a result view or back
///   to the default notebook.
/// - `is_showing_result_view` reports whether a transient view is visible,
///   so the engine only reverts views it put up.
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Posts a vault change notification
    async fn notify(&self, notification: &VaultNotification) -> anyhow::Result<()>;

    /// Switches the note list view
    async fn show_result_view(&self, view: &ResultView) -> anyhow::Result<()>;

    /// Whether a transient result view is currently visible
    async fn is_showing_result_view(&self) -> bool;
}
