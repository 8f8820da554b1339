//! Event inbox
//!
//! The companion app drops JSON command files into `<mirror>/.events`.
//! Each file is deleted before it is applied, so delivery is at most once:
//! an event lost to a crash is acceptable because it only replays an
//! action the companion already completed on the mirror.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vaultsync_audit::{ActionLog, ReasonCode};
use vaultsync_core::config::SyncConfig;
use vaultsync_core::domain::event::EVENT_FILE_EXTENSION;
use vaultsync_core::domain::replica::attachments_for;
use vaultsync_core::domain::{
    bare_name, resolve_relative, ContentHash, MoveEvent, NoteRef, Replica, SyncEvent, SyncResult,
};
use vaultsync_core::ports::{INotificationService, VaultNotification};

use crate::filesystem;
use crate::hasher::ContentHasher;
use crate::path_lock::PathLocks;
use crate::SyncError;

/// Consumes `.events` command files
pub struct EventInbox {
    vault: Replica,
    mirror: Replica,
    action_log: Arc<ActionLog>,
    locks: PathLocks,
    notifier: Arc<dyn INotificationService>,
}

impl EventInbox {
    pub fn new(
        vault: Replica,
        mirror: Replica,
        action_log: Arc<ActionLog>,
        locks: PathLocks,
        notifier: Arc<dyn INotificationService>,
    ) -> Self {
        Self {
            vault,
            mirror,
            action_log,
            locks,
            notifier,
        }
    }

    /// Event files currently waiting, sorted by name
    ///
    /// # Errors
    /// Returns `SyncError::Io` if the events folder cannot be listed.
    pub async fn pending(&self) -> Result<Vec<PathBuf>, SyncError> {
        let dir = self.mirror.events_dir();
        let mut files = Vec::new();
        for (name, is_dir) in filesystem::list_names(&dir).await? {
            let is_event = Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(EVENT_FILE_EXTENSION));
            if !is_dir && is_event {
                files.push(dir.join(name));
            }
        }
        Ok(files)
    }

    /// Apply and delete every pending event.
    ///
    /// `newnotebook` events enroll their notebook in `settings`. Counters and
    /// per-event failures go into `result`. Only a failure to list the events
    /// folder is returned as an error.
    #[instrument(skip_all)]
    pub async fn drain(
        &self,
        settings: &mut SyncConfig,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        let files = self.pending().await?;
        if files.is_empty() {
            return Ok(());
        }
        info!(count = files.len(), "Draining mobile events");

        for file in files {
            let text = tokio::fs::read_to_string(&file).await;
            if let Err(e) = tokio::fs::remove_file(&file).await {
                warn!(file = %file.display(), error = %e, "Failed to delete event file");
            }

            let event = match text {
                Ok(text) => SyncEvent::parse(&text).map_err(|e| SyncError::InvalidEvent {
                    file: file.clone(),
                    reason: e.to_string(),
                }),
                Err(e) => Err(SyncError::io(&file, e)),
            };

            let applied = match event {
                Ok(event) => {
                    debug!(file = %file.display(), op = event.op(), "Applying event");
                    self.apply(event, settings, result).await
                }
                Err(e) => Err(e),
            };

            if let Err(e) = applied {
                warn!(
                    reason = %reason_for(&e),
                    file = %file.display(),
                    error = %e,
                    "Event not applied"
                );
                result.errors.push(e.to_string());
            }
        }
        Ok(())
    }

    async fn apply(
        &self,
        event: SyncEvent,
        settings: &mut SyncConfig,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        match event {
            SyncEvent::NewNotebook { name } => self.apply_new_notebook(&name, settings).await,
            SyncEvent::Move(mv) => self.apply_move(&mv, result).await,
        }
    }

    async fn apply_new_notebook(&self, raw: &str, settings: &mut SyncConfig) -> Result<(), SyncError> {
        let name = bare_name(raw).ok_or_else(|| SyncError::InvalidEvent {
            file: self.mirror.events_dir(),
            reason: format!("unusable notebook name: {raw:?}"),
        })?;
        let dir = self.vault.notebook_dir(&name);
        filesystem::ensure_dir(&dir).await?;

        self.notify(VaultNotification::NotebookCreated {
            notebook: name.clone(),
        })
        .await;
        self.notify(VaultNotification::NotebookListChanged).await;
        self.action_log.log_new(&dir).await;
        if settings.enroll(name.clone()) {
            info!(notebook = %name, "Notebook created by companion app and enrolled");
        }
        Ok(())
    }

    async fn apply_move(&self, mv: &MoveEvent, result: &mut SyncResult) -> Result<(), SyncError> {
        let root = self.vault.root();
        let source_note = resolve_relative(root, &mv.source_note)?;
        let mut dest_note = resolve_relative(root, &mv.dest_note)?;
        if let Some(renamed) = mv.autorenamed().and_then(bare_name) {
            dest_note.set_file_name(renamed);
        }

        if !filesystem::is_file(&source_note).await {
            debug!(
                reason = %ReasonCode::SourceMissing,
                source = %source_note.display(),
                "Move source not in vault, nothing to replay"
            );
            return Ok(());
        }

        let actual = ContentHasher::hash_file(&source_note).await?;
        let expected = ContentHash::new(mv.content_hash.clone()).ok();
        if expected.as_ref() != Some(&actual) {
            return Err(SyncError::HashMismatch {
                path: source_note,
                expected: mv.content_hash.clone(),
                actual: actual.to_string(),
            });
        }

        let source_ref = NoteRef::from_note_path(&source_note)?;
        let dest_ref = NoteRef::from_note_path(&dest_note)?;
        let source_meta = match mv.source_meta() {
            Some(rel) => resolve_relative(root, rel)?,
            None => self.vault.meta_path(&source_ref),
        };
        let dest_meta = match mv.dest_meta() {
            Some(rel) => resolve_relative(root, rel)?,
            None => self.vault.meta_path(&dest_ref),
        };

        if filesystem::exists(&dest_note).await {
            return Err(SyncError::DestinationExists(dest_note));
        }
        if filesystem::exists(&dest_meta).await {
            return Err(SyncError::DestinationExists(dest_meta));
        }

        {
            let _guard = self.locks.lock(&dest_note).await;
            filesystem::move_file(&source_note, &dest_note).await?;
        }
        result.moved += 1;
        self.action_log.log_move(&source_note, &dest_note).await;

        if filesystem::exists(&source_meta).await {
            filesystem::move_file(&source_meta, &dest_meta).await?;
        }
        let source_attachments = attachments_for(&source_note);
        if filesystem::is_dir(&source_attachments).await {
            filesystem::move_dir(&source_attachments, &attachments_for(&dest_note)).await?;
        }

        info!(
            source = %source_note.display(),
            destination = %dest_note.display(),
            "Replayed note move from companion app"
        );
        self.notify(VaultNotification::NoteMoved {
            from: source_note,
            to: dest_note,
        })
        .await;
        self.notify(VaultNotification::NotebookRefreshed {
            notebook: source_ref.notebook().to_string(),
        })
        .await;
        self.notify(VaultNotification::NotebookRefreshed {
            notebook: dest_ref.notebook().to_string(),
        })
        .await;
        Ok(())
    }

    async fn notify(&self, notification: VaultNotification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(error = %e, notification = %notification, "Failed to deliver notification");
        }
    }
}

fn reason_for(err: &SyncError) -> ReasonCode {
    match err {
        SyncError::HashMismatch { .. } => ReasonCode::HashMismatch,
        SyncError::DestinationExists(_) => ReasonCode::DestinationExists,
        SyncError::InvalidEvent { .. } | SyncError::DomainError(_) => ReasonCode::InvalidEvent,
        SyncError::InvalidMeta { .. } => ReasonCode::InvalidMeta,
        SyncError::Io { .. } | SyncError::Task(_) => ReasonCode::IoFailure,
    }
}
