//! Immediate mirror propagation
//!
//! Renames and moves made in the local UI are applied to the mirror right
//! away instead of waiting for the next pass. A pass would otherwise see
//! the old name on the mirror and the new one locally and copy both ways.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use vaultsync_audit::{ActionLog, ReasonCode};
use vaultsync_core::config::SyncConfig;
use vaultsync_core::domain::replica::TRASH_NOTEBOOK;
use vaultsync_core::domain::{NoteRef, Replica};

use crate::filesystem;
use crate::path_lock::PathLocks;
use crate::SyncError;

/// What propagation did on the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Nothing to do for this enrollment combination
    Unchanged,
    /// A target already existed on the mirror
    Skipped,
    /// Note, meta and attachments moved or renamed
    Moved,
    /// Mirror copy removed because the note left sync
    Deleted,
}

/// Applies local renames and moves to the mirror
pub struct MirrorPropagator {
    mirror: Replica,
    action_log: Arc<ActionLog>,
    locks: PathLocks,
}

impl MirrorPropagator {
    pub fn new(mirror: Replica, action_log: Arc<ActionLog>, locks: PathLocks) -> Self {
        Self {
            mirror,
            action_log,
            locks,
        }
    }

    /// A note was renamed inside its notebook.
    ///
    /// # Errors
    /// Returns `SyncError::Io` if a mirror file cannot be moved.
    #[instrument(skip(self, settings), fields(note = %note))]
    pub async fn on_note_rename(
        &self,
        note: &NoteRef,
        new_file_name: &str,
        settings: &SyncConfig,
    ) -> Result<Propagation, SyncError> {
        if !settings.is_enrolled(note.notebook()) {
            return Ok(Propagation::Unchanged);
        }
        let renamed = note.renamed(new_file_name)?;
        self.relocate(note, &renamed, true).await
    }

    /// A note was moved to another notebook.
    ///
    /// | source enrolled | destination enrolled | mirror effect |
    /// |-----------------|----------------------|---------------|
    /// | no              | either               | none          |
    /// | yes             | no                   | delete        |
    /// | yes             | yes                  | move          |
    ///
    /// The trash notebook counts as enrolled so trashed notes keep their
    /// mirror copy.
    ///
    /// # Errors
    /// Returns `SyncError::Io` if a mirror file cannot be moved or removed.
    #[instrument(skip(self, settings), fields(note = %note, destination = dest_notebook))]
    pub async fn on_note_move(
        &self,
        note: &NoteRef,
        dest_notebook: &str,
        settings: &SyncConfig,
    ) -> Result<Propagation, SyncError> {
        let source_enrolled = settings.is_enrolled(note.notebook());
        let dest_enrolled = settings.is_enrolled(dest_notebook)
            || dest_notebook.eq_ignore_ascii_case(TRASH_NOTEBOOK);

        match (source_enrolled, dest_enrolled) {
            (false, _) => {
                debug!("Source notebook not synced, next pass picks up the note if needed");
                Ok(Propagation::Unchanged)
            }
            (true, false) => self.remove(note).await,
            (true, true) => {
                let moved = note.in_notebook(dest_notebook)?;
                self.relocate(note, &moved, false).await
            }
        }
    }

    async fn relocate(
        &self,
        from: &NoteRef,
        to: &NoteRef,
        check_attachments: bool,
    ) -> Result<Propagation, SyncError> {
        let source_note = self.mirror.note_path(from);
        let dest_note = self.mirror.note_path(to);
        let dest_meta = self.mirror.meta_path(to);
        let dest_attachments = self.mirror.attachments_path(to);

        for target in [&dest_note, &dest_meta] {
            if filesystem::exists(target).await {
                return Ok(self.skip(target));
            }
        }
        if check_attachments && filesystem::exists(&dest_attachments).await {
            return Ok(self.skip(&dest_attachments));
        }

        if filesystem::exists(&source_note).await {
            let _guard = self.locks.lock(&dest_note).await;
            filesystem::move_file(&source_note, &dest_note).await?;
            self.action_log.log_move(&source_note, &dest_note).await;
        }
        let source_meta = self.mirror.meta_path(from);
        if filesystem::exists(&source_meta).await {
            filesystem::move_file(&source_meta, &dest_meta).await?;
        }
        let source_attachments = self.mirror.attachments_path(from);
        if filesystem::is_dir(&source_attachments).await {
            filesystem::move_dir(&source_attachments, &dest_attachments).await?;
        }

        info!(from = %from, to = %to, "Propagated to mirror");
        Ok(Propagation::Moved)
    }

    async fn remove(&self, note: &NoteRef) -> Result<Propagation, SyncError> {
        let mirror_note = self.mirror.note_path(note);
        if filesystem::exists(&mirror_note).await {
            let _guard = self.locks.lock(&mirror_note).await;
            filesystem::remove_path(&mirror_note).await?;
            self.action_log.log_delete(&mirror_note).await;
        }
        filesystem::remove_path(&self.mirror.meta_path(note)).await?;
        filesystem::remove_path(&self.mirror.attachments_path(note)).await?;
        info!("Note left synced notebooks, removed mirror copy");
        Ok(Propagation::Deleted)
    }

    fn skip(&self, target: &Path) -> Propagation {
        info!(
            reason = %ReasonCode::DestinationExists,
            target = %target.display(),
            "Mirror target exists, not propagating"
        );
        Propagation::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn setup() -> (TempDir, TempDir, MirrorPropagator) {
        let local = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        let propagator = MirrorPropagator::new(
            Replica::remote(remote.path()),
            Arc::new(ActionLog::for_vault(&Replica::local(local.path()))),
            PathLocks::new(),
        );
        (local, remote, propagator)
    }

    fn settings(notebooks: &[&str]) -> SyncConfig {
        let mut settings = SyncConfig::default();
        for nb in notebooks {
            settings.enroll(*nb);
        }
        settings
    }

    #[tokio::test]
    async fn test_rename_moves_note_meta_and_attachments() {
        let (local, remote, propagator) = setup();
        let m = remote.path();
        write(m, "A/old.md", "x");
        write(m, ".meta/A_old.md", "{}");
        write(m, "A/old.md.attachments/pic.png", "p");

        let note = NoteRef::new("A", "old.md").unwrap();
        let outcome = propagator
            .on_note_rename(&note, "new.md", &settings(&["A"]))
            .await
            .unwrap();

        assert_eq!(outcome, Propagation::Moved);
        assert!(m.join("A/new.md").exists());
        assert!(m.join(".meta/A_new.md").exists());
        assert!(m.join("A/new.md.attachments/pic.png").exists());
        assert!(!m.join("A/old.md").exists());
        let log = std::fs::read_to_string(local.path().join(".synclog")).unwrap();
        assert!(log.contains(",MOVE,"));
    }

    #[tokio::test]
    async fn test_rename_in_unenrolled_notebook_is_ignored() {
        let (_local, remote, propagator) = setup();
        write(remote.path(), "A/old.md", "x");
        let note = NoteRef::new("A", "old.md").unwrap();
        let outcome = propagator
            .on_note_rename(&note, "new.md", &settings(&[]))
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::Unchanged);
        assert!(remote.path().join("A/old.md").exists());
    }

    #[tokio::test]
    async fn test_rename_skipped_when_target_exists() {
        let (_local, remote, propagator) = setup();
        write(remote.path(), "A/old.md", "x");
        write(remote.path(), "A/new.md.attachments/a", "y");
        let note = NoteRef::new("A", "old.md").unwrap();
        let outcome = propagator
            .on_note_rename(&note, "new.md", &settings(&["A"]))
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::Skipped);
        assert!(remote.path().join("A/old.md").exists());
    }

    #[tokio::test]
    async fn test_move_out_of_sync_deletes_mirror_copy() {
        let (local, remote, propagator) = setup();
        let m = remote.path();
        write(m, "A/n.md", "x");
        write(m, ".meta/A_n.md", "{}");
        write(m, "A/n.md.attachments/pic.png", "p");

        let note = NoteRef::new("A", "n.md").unwrap();
        let outcome = propagator
            .on_note_move(&note, "Private", &settings(&["A"]))
            .await
            .unwrap();

        assert_eq!(outcome, Propagation::Deleted);
        assert!(!m.join("A/n.md").exists());
        assert!(!m.join(".meta/A_n.md").exists());
        assert!(!m.join("A/n.md.attachments").exists());
        let log = std::fs::read_to_string(local.path().join(".synclog")).unwrap();
        assert!(log.contains(",DEL,"));
    }

    #[tokio::test]
    async fn test_move_to_trash_keeps_mirror_copy() {
        let (_local, remote, propagator) = setup();
        write(remote.path(), "A/n.md", "x");
        let note = NoteRef::new("A", "n.md").unwrap();
        let outcome = propagator
            .on_note_move(&note, "Trash", &settings(&["A"]))
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::Moved);
        assert!(remote.path().join("Trash/n.md").exists());
    }

    #[tokio::test]
    async fn test_move_into_sync_waits_for_next_pass() {
        let (_local, remote, propagator) = setup();
        let note = NoteRef::new("Private", "n.md").unwrap();
        let outcome = propagator
            .on_note_move(&note, "A", &settings(&["A"]))
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::Unchanged);
        assert!(!remote.path().join("A/n.md").exists());
    }

    #[tokio::test]
    async fn test_move_between_synced_notebooks_skips_existing_target() {
        let (_local, remote, propagator) = setup();
        write(remote.path(), "A/n.md", "x");
        write(remote.path(), "B/n.md", "other");
        let note = NoteRef::new("A", "n.md").unwrap();
        let outcome = propagator
            .on_note_move(&note, "B", &settings(&["A", "B"]))
            .await
            .unwrap();
        assert_eq!(outcome, Propagation::Skipped);
        assert_eq!(
            std::fs::read_to_string(remote.path().join("B/n.md")).unwrap(),
            "other"
        );
    }
}
