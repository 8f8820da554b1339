//! Reconciliation executor
//!
//! Applies one planned copy: conflict guard, retention of whatever the copy
//! would overwrite, the note copy itself, the `synced` stamp on the source
//! meta, the meta copy, and the attachments merge.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vaultsync_audit::{ActionLog, ReasonCode};
use vaultsync_conflict::{ConflictDetector, DetectionResult};
use vaultsync_core::domain::{NoteMeta, NoteRef, Replica, Side, SyncAction};
use vaultsync_core::ports::{INotificationService, VaultNotification};

use crate::filesystem;
use crate::path_lock::PathLocks;
use crate::SyncError;

/// What happened to one note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    /// Nothing to do
    InSync,
    /// Copied local → remote
    Pushed,
    /// Copied remote → local
    Pulled,
    /// Skipped by the conflict guard
    Conflict,
}

/// Executes planned copies between the vault and the mirror
pub struct ReconciliationExecutor {
    vault: Replica,
    mirror: Replica,
    action_log: Arc<ActionLog>,
    locks: PathLocks,
    notifier: Arc<dyn INotificationService>,
}

impl ReconciliationExecutor {
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

    fn replica(&self, side: Side) -> &Replica {
        match side {
            Side::Local => &self.vault,
            Side::Remote => &self.mirror,
        }
    }

    /// Apply `action` to `note`.
    ///
    /// # Errors
    /// Returns `SyncError::InvalidMeta` before touching anything when a meta
    /// record exists but does not parse. Otherwise returns the first I/O
    /// failure. Files already moved into `.retained`
    /// stay there; nothing else of this note is touched after the failure.
    #[instrument(skip(self), fields(note = %note))]
    pub async fn execute(&self, note: &NoteRef, action: SyncAction) -> Result<NoteOutcome, SyncError> {
        let (Some(src_side), Some(dst_side)) = (action.source(), action.destination()) else {
            return Ok(NoteOutcome::InSync);
        };
        let src = self.replica(src_side);
        let dst = self.replica(dst_side);

        let source_note = src.note_path(note);
        let dest_note = dst.note_path(note);

        // Conflict guard: only when the copy would overwrite something.
        let source_mtime = filesystem::mtime_ms(&source_note).await?;
        let dest_mtime = filesystem::mtime_ms(&dest_note).await?;
        if source_mtime.is_some() && dest_mtime.is_some() {
            let synced = read_meta(&self.vault.meta_path(note))
                .await?
                .map_or(0, |meta| meta.synced());
            if let DetectionResult::Conflicted(edit) =
                ConflictDetector::check(note, synced, dest_mtime)
            {
                info!(
                    reason = %ReasonCode::Conflict,
                    synced = edit.synced_ms,
                    destination_mtime = edit.destination_mtime_ms,
                    "Note modified on both sides, skipping copy"
                );
                return Ok(NoteOutcome::Conflict);
            }
        }

        // An unparsable source meta must fail before anything is written.
        let source_meta = src.meta_path(note);
        let source_record = read_meta(&source_meta).await?;

        // 1-2: retain and copy the note under its path lock.
        {
            let _guard = self.locks.lock(&dest_note).await;
            if dest_mtime.is_some() {
                filesystem::retain(&dest_note, &dst.retained_dir()).await?;
            }
            filesystem::copy_preserving_mtime(&source_note, &dest_note).await?;
        }

        // 3: stamp an existing source meta with the source note's mtime.
        let synced_at = filesystem::mtime_ms(&source_note)
            .await?
            .ok_or_else(|| SyncError::io(&source_note, std::io::ErrorKind::NotFound.into()))?;
        let has_source_meta = source_record.is_some();
        if let Some(mut meta) = source_record {
            meta.set_synced(synced_at);
            let _guard = self.locks.lock(&source_meta).await;
            tokio::fs::write(&source_meta, meta.to_pretty_string())
                .await
                .map_err(|e| SyncError::io(&source_meta, e))?;
        }

        // 4: retain the destination meta, then copy the source meta over.
        let dest_meta = dst.meta_path(note);
        {
            let _guard = self.locks.lock(&dest_meta).await;
            if filesystem::exists(&dest_meta).await {
                filesystem::retain(&dest_meta, &dst.retained_dir()).await?;
            }
            if has_source_meta {
                filesystem::copy_preserving_mtime(&source_meta, &dest_meta).await?;
            }
        }

        // 5: merge attachments, source wins.
        let source_attachments = src.attachments_path(note);
        if filesystem::is_dir(&source_attachments).await {
            filesystem::merge_dir(
                &source_attachments,
                &dst.attachments_path(note),
                Some(&self.locks),
            )
            .await?;
        }

        // 6: bookkeeping.
        self.action_log.log_copy(&source_note, &dest_note).await;
        debug!(
            source = %source_note.display(),
            destination = %dest_note.display(),
            synced = synced_at,
            "note copied"
        );

        match action {
            SyncAction::PullFromRemote => {
                self.notify(VaultNotification::NotebookRefreshed {
                    notebook: note.notebook().to_string(),
                })
                .await;
                Ok(NoteOutcome::Pulled)
            }
            _ => Ok(NoteOutcome::Pushed),
        }
    }

    async fn notify(&self, notification: VaultNotification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(error = %e, notification = %notification, "Failed to deliver notification");
        }
    }
}

/// Read the meta record at `path`. A missing record is `None`; a record
/// that exists but does not parse is an error so its fields are never
/// replaced.
async fn read_meta(path: &Path) -> Result<Option<NoteMeta>, SyncError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::io(path, e)),
    };
    NoteMeta::parse(&text)
        .map(Some)
        .map_err(|e| SyncError::InvalidMeta {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
