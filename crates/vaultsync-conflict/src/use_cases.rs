//! Conflict use cases - surface pass results to the UI
//!
//! Integrates the view policy with the notification port. The sync
//! orchestrator calls this once per pass after reconciliation.

use std::sync::Arc;

use tracing::{debug, info};
use vaultsync_core::{
    domain::NoteRef,
    ports::{INotificationService, ResultView},
};

use crate::{error::ConflictError, policy::ResultViewPolicy};

/// Shows the Conflict or Updated view chosen by [`ResultViewPolicy`]
pub struct PresentResultsUseCase {
    notifier: Arc<dyn INotificationService>,
}

impl PresentResultsUseCase {
    pub fn new(notifier: Arc<dyn INotificationService>) -> Self {
        Self { notifier }
    }

    /// Switch the note list to the follow-up view, if any.
    ///
    /// Returns the view that was shown.
    pub async fn execute(
        &self,
        conflicts: &[NoteRef],
        updated: &[NoteRef],
    ) -> Result<Option<ResultView>, ConflictError> {
        let showing = self.notifier.is_showing_result_view().await;
        let Some(view) = ResultViewPolicy::decide(conflicts, updated, showing) else {
            debug!("No result view to show");
            return Ok(None);
        };

        match &view {
            ResultView::Show(set) => info!(view = %set.title(), "Showing result view"),
            ResultView::DefaultNotebook => debug!("Reverting to default notebook view"),
        }

        self.notifier
            .show_result_view(&view)
            .await
            .map_err(ConflictError::Notification)?;
        Ok(Some(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vaultsync_core::ports::VaultNotification;

    struct RecordingNotifier {
        showing: bool,
        fail: bool,
        views: Mutex<Vec<ResultView>>,
    }

    impl RecordingNotifier {
        fn new(showing: bool, fail: bool) -> Self {
            Self {
                showing,
                fail,
                views: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl INotificationService for RecordingNotifier {
        async fn notify(&self, _: &VaultNotification) -> anyhow::Result<()> {
            Ok(())
        }

        async fn show_result_view(&self, view: &ResultView) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no UI attached");
            }
            self.views.lock().unwrap().push(view.clone());
            Ok(())
        }

        async fn is_showing_result_view(&self) -> bool {
            self.showing
        }
    }

    #[tokio::test]
    async fn test_shows_conflicts() {
        let notifier = Arc::new(RecordingNotifier::new(false, false));
        let use_case = PresentResultsUseCase::new(notifier.clone());
        let conflicts = vec![NoteRef::new("A", "x.md").unwrap()];

        let view = use_case.execute(&conflicts, &[]).await.unwrap();

        assert!(matches!(view, Some(ResultView::Show(_))));
        assert_eq!(notifier.views.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_shown_when_idle() {
        let notifier = Arc::new(RecordingNotifier::new(false, false));
        let use_case = PresentResultsUseCase::new(notifier.clone());

        assert_eq!(use_case.execute(&[], &[]).await.unwrap(), None);
        assert!(notifier.views.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_is_reported() {
        let notifier = Arc::new(RecordingNotifier::new(true, true));
        let use_case = PresentResultsUseCase::new(notifier);

        let err = use_case.execute(&[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("failed to show result view"));
    }
}
