//! Sync orchestrator
//!
//! The [`SyncOrchestrator`] runs one full pass between the local vault and
//! the remote mirror.
//!
//! ## Pass Flow
//!
//! 1. **Validating**: entry guards, each aborting without side effects
//! 2. **DrainingEvents**: apply every `.events` command file
//! 3. **ReconcilingNotebooks**: plan and copy each note of each enrolled notebook
//! 4. Show the Conflict or Updated view
//! 5. **Exporting**: write the search index
//!
//! Per-note failures are collected in [`SyncResult::errors`] and never
//! abort the pass.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use vaultsync_audit::ActionLog;
use vaultsync_conflict::PresentResultsUseCase;
use vaultsync_core::config::SyncConfig;
use vaultsync_core::domain::{PassState, Replica, SyncBlocked, SyncResult};
use vaultsync_core::ports::{IMirrorLocator, INotificationService, ITagResolver};

use crate::executor::{NoteOutcome, ReconciliationExecutor};
use crate::exporter::{ExportSummary, SearchIndexExporter};
use crate::inbox::EventInbox;
use crate::path_lock::PathLocks;
use crate::planner;
use crate::propagate::MirrorPropagator;
use crate::scheduler::PassGate;
use crate::{filesystem, SyncError};

/// Runs sync passes between the vault and the mirror
pub struct SyncOrchestrator {
    vault: Replica,
    mirror_locator: Arc<dyn IMirrorLocator>,
    notifier: Arc<dyn INotificationService>,
    tags: Arc<dyn ITagResolver>,
    action_log: Arc<ActionLog>,
    locks: PathLocks,
    gate: PassGate,
    export_enabled: bool,
    state: watch::Sender<PassState>,
}

impl SyncOrchestrator {
    /// Creates a new `SyncOrchestrator`
    ///
    /// # Arguments
    /// * `vault` - Local vault replica
    /// * `mirror_locator` - Finds the mirror root at the start of each pass
    /// * `notifier` - UI notifications and result views
    /// * `tags` - Tag display names for the search index
    pub fn new(
        vault: Replica,
        mirror_locator: Arc<dyn IMirrorLocator>,
        notifier: Arc<dyn INotificationService>,
        tags: Arc<dyn ITagResolver>,
    ) -> Self {
        let action_log = Arc::new(ActionLog::for_vault(&vault));
        let (state, _) = watch::channel(PassState::Idle);
        Self {
            vault,
            mirror_locator,
            notifier,
            tags,
            action_log,
            locks: PathLocks::new(),
            gate: PassGate::new(),
            export_enabled: true,
            state,
        }
    }

    /// Enable or disable the search index export at the end of each pass
    pub fn with_export(mut self, enabled: bool) -> Self {
        self.export_enabled = enabled;
        self
    }

    /// Share a lock table with viewers
    pub fn with_locks(mut self, locks: PathLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Share a busy flag with other orchestrators over the same vault
    pub fn with_gate(mut self, gate: PassGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn vault(&self) -> &Replica {
        &self.vault
    }

    pub fn locks(&self) -> &PathLocks {
        &self.locks
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.action_log
    }

    /// Current phase of the running pass, `Idle` between passes
    pub fn state(&self) -> PassState {
        *self.state.borrow()
    }

    /// Watch phase changes
    pub fn subscribe_state(&self) -> watch::Receiver<PassState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: PassState) {
        debug!(state = %state, "Pass state");
        self.state.send_replace(state);
    }

    /// The mirror replica, if the locator finds one
    pub fn locate_mirror(&self) -> Option<Replica> {
        self.mirror_locator.locate().map(Replica::remote)
    }

    // ========================================================================
    // Pass
    // ========================================================================

    /// Run one sync pass.
    ///
    /// `settings` may gain enrolled notebooks from `newnotebook` events; the
    /// caller persists it afterwards. A pass that cannot start returns a
    /// result with [`SyncResult::blocked`] set.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, settings: &mut SyncConfig) -> SyncResult {
        let Some(_permit) = self.gate.try_begin() else {
            warn!("Sync pass already running, request ignored");
            return SyncResult::blocked(SyncBlocked::AlreadyRunning);
        };
        let start = Instant::now();

        self.set_state(PassState::Validating);
        let mirror = match self.check_environment(settings).await {
            Ok(mirror) => mirror,
            Err(reason) => {
                info!(reason = %reason, "Sync pass not started");
                self.set_state(PassState::Idle);
                return SyncResult::blocked(reason);
            }
        };

        info!(
            vault = %self.vault.root().display(),
            mirror = %mirror.root().display(),
            notebooks = settings.notebooks.len(),
            "Starting sync pass"
        );
        let mut result = SyncResult::new();

        // Events first: they may enroll notebooks and move notes.
        self.set_state(PassState::DrainingEvents);
        let inbox = EventInbox::new(
            self.vault.clone(),
            mirror.clone(),
            Arc::clone(&self.action_log),
            self.locks.clone(),
            Arc::clone(&self.notifier),
        );
        if let Err(e) = inbox.drain(settings, &mut result).await {
            warn!(error = %e, "Failed to read events folder");
            result.errors.push(e.to_string());
        }

        self.set_state(PassState::ReconcilingNotebooks);
        let executor = ReconciliationExecutor::new(
            self.vault.clone(),
            mirror.clone(),
            Arc::clone(&self.action_log),
            self.locks.clone(),
            Arc::clone(&self.notifier),
        );
        for notebook in &settings.notebooks {
            if let Err(e) = self
                .reconcile_notebook(&executor, &mirror, notebook, settings, &mut result)
                .await
            {
                warn!(notebook = %notebook, error = %e, "Notebook skipped");
                result.errors.push(format!("{notebook}: {e}"));
            }
        }

        let presenter = PresentResultsUseCase::new(Arc::clone(&self.notifier));
        if let Err(e) = presenter.execute(&result.conflicts, &result.updated).await {
            warn!(error = %e, "Failed to show result view");
        }

        if self.export_enabled {
            self.set_state(PassState::Exporting);
            let exporter =
                SearchIndexExporter::new(self.vault.clone(), mirror, Arc::clone(&self.tags));
            if let Err(e) = exporter.export(settings).await {
                warn!(error = %e, "Search index export failed");
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        self.set_state(PassState::Idle);
        info!(
            in_sync = result.in_sync,
            pushed = result.pushed,
            pulled = result.pulled,
            moved = result.moved,
            conflicts = result.conflicts.len(),
            errors = result.errors.len(),
            duration_ms = result.duration_ms,
            "Sync pass completed"
        );
        result
    }

    async fn reconcile_notebook(
        &self,
        executor: &ReconciliationExecutor,
        mirror: &Replica,
        notebook: &str,
        settings: &SyncConfig,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        for dir in [self.vault.notebook_dir(notebook), mirror.notebook_dir(notebook)] {
            if !filesystem::is_dir(&dir).await {
                info!(path = %dir.display(), "Creating notebook folder");
                filesystem::ensure_dir(&dir).await?;
            }
        }

        for planned in planner::plan_notebook(&self.vault, mirror, notebook, settings).await? {
            match executor.execute(&planned.note, planned.action).await {
                Ok(NoteOutcome::InSync) => result.in_sync += 1,
                Ok(NoteOutcome::Pushed) => result.pushed += 1,
                Ok(NoteOutcome::Pulled) => {
                    result.pulled += 1;
                    result.updated.push(planned.note);
                }
                Ok(NoteOutcome::Conflict) => result.conflicts.push(planned.note),
                Err(e) => {
                    warn!(note = %planned.note, error = %e, "Note skipped");
                    result.errors.push(format!("{}: {e}", planned.note));
                }
            }
        }
        Ok(())
    }

    /// Run the search index export on its own.
    ///
    /// # Errors
    /// Fails if the mirror cannot be located or the index cannot be written.
    pub async fn export(&self, settings: &SyncConfig) -> anyhow::Result<ExportSummary> {
        let mirror = self.check_environment(settings).await?;
        let exporter = SearchIndexExporter::new(self.vault.clone(), mirror, Arc::clone(&self.tags));
        Ok(exporter.export(settings).await?)
    }

    /// Propagator for local renames and moves, bound to the located mirror
    pub fn propagator(&self) -> Option<MirrorPropagator> {
        self.locate_mirror().map(|mirror| {
            MirrorPropagator::new(mirror, Arc::clone(&self.action_log), self.locks.clone())
        })
    }

    // ========================================================================
    // Entry guards
    // ========================================================================

    /// Check the entry guards in order and return the mirror replica.
    async fn check_environment(&self, settings: &SyncConfig) -> Result<Replica, SyncBlocked> {
        let Some(mirror_root) = self.mirror_locator.locate() else {
            return Err(SyncBlocked::MirrorNotFound);
        };

        let vault_real = canonical(self.vault.root()).await;
        let mirror_real = canonical(&mirror_root).await;
        if vault_real.starts_with(&mirror_real) {
            return Err(SyncBlocked::VaultInsideMirror);
        }

        if !filesystem::is_dir(&mirror_root).await {
            return Err(SyncBlocked::MirrorMissing(mirror_root.display().to_string()));
        }
        if !settings.enabled {
            return Err(SyncBlocked::Disabled);
        }
        if settings.notebooks.is_empty() {
            return Err(SyncBlocked::NothingEnrolled);
        }
        Ok(Replica::remote(mirror_root))
    }

    /// Human-readable description of what a pass would do right now
    pub async fn settings_help_text(&self, settings: &SyncConfig) -> String {
        match self.check_environment(settings).await {
            Err(reason) => reason.to_string(),
            Ok(mirror) => {
                let notebooks: Vec<&str> = settings.notebooks.iter().map(String::as_str).collect();
                format!(
                    "Syncing {} notebook{} ({}) between {} and {}.",
                    notebooks.len(),
                    if notebooks.len() == 1 { "" } else { "s" },
                    notebooks.join(", "),
                    self.vault.root().display(),
                    mirror.root().display()
                )
            }
        }
    }
}

/// Resolved path for containment checks; the path itself if it cannot be
/// resolved (for instance because it does not exist yet).
async fn canonical(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

// ============================================================================
// Unit tests
// ============================================================================
