//! Terminal notification adapter
//!
//! The CLI has no note list to refresh. Notifications become log lines and
//! the result view is remembered so a later pass in `sync --watch` can
//! revert it.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;
use vaultsync_core::ports::{INotificationService, ResultView, VaultNotification};

/// Logs notifications through `tracing`
#[derive(Debug, Default)]
pub struct LogNotifier {
    showing_result_view: AtomicBool,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl INotificationService for LogNotifier {
    async fn notify(&self, notification: &VaultNotification) -> anyhow::Result<()> {
        info!(notification = %notification, "Vault changed");
        Ok(())
    }

    async fn show_result_view(&self, view: &ResultView) -> anyhow::Result<()> {
        match view {
            ResultView::Show(set) => {
                let notes: Vec<String> = set.notes().iter().map(ToString::to_string).collect();
                info!(view = %set.title(), notes = ?notes, "Result view");
                self.showing_result_view.store(true, Ordering::Release);
            }
            ResultView::DefaultNotebook => {
                self.showing_result_view.store(false, Ordering::Release);
            }
        }
        Ok(())
    }

    async fn is_showing_result_view(&self) -> bool {
        self.showing_result_view.load(Ordering::Acquire)
    }
}
