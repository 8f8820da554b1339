//! Reconciliation planner
//!
//! Lists the candidate note names of a notebook on both sides and decides,
//! per name, which way (if any) content should flow. Pure apart from the
//! directory listing.

use std::collections::BTreeSet;

use tracing::debug;
use vaultsync_core::config::SyncConfig;
use vaultsync_core::domain::{NoteRef, Replica, SyncAction};

use crate::filesystem;
use crate::SyncError;

/// Decide the action for one note from the modification times of its two
/// copies (`None` = absent on that side).
pub fn plan(local_mtime_ms: Option<i64>, remote_mtime_ms: Option<i64>) -> SyncAction {
    match (local_mtime_ms, remote_mtime_ms) {
        (Some(_), None) => SyncAction::PushToRemote,
        (None, Some(_)) => SyncAction::PullFromRemote,
        (Some(local), Some(remote)) if local > remote => SyncAction::PushToRemote,
        (Some(local), Some(remote)) if local < remote => SyncAction::PullFromRemote,
        _ => SyncAction::None,
    }
}

/// A note together with the planned action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNote {
    pub note: NoteRef,
    pub action: SyncAction,
    /// Both sides had the note when it was planned
    pub both_exist: bool,
}

/// Union of note file names found in `notebook` on either side, filtered to
/// recognized note files. Directories are never candidates.
///
/// # Errors
/// Returns `SyncError::Io` if a notebook directory cannot be listed.
pub async fn list_candidates(
    vault: &Replica,
    mirror: &Replica,
    notebook: &str,
    settings: &SyncConfig,
) -> Result<BTreeSet<String>, SyncError> {
    let mut names = BTreeSet::new();
    for replica in [vault, mirror] {
        for (name, is_dir) in filesystem::list_names(&replica.notebook_dir(notebook)).await? {
            if !is_dir && settings.is_note_file(&name) {
                names.insert(name);
            }
        }
    }
    debug!(notebook, candidates = names.len(), "listed candidate notes");
    Ok(names)
}

/// Plan every candidate note of a notebook.
///
/// # Errors
/// Returns `SyncError::Io` if listing or stat-ing fails.
pub async fn plan_notebook(
    vault: &Replica,
    mirror: &Replica,
    notebook: &str,
    settings: &SyncConfig,
) -> Result<Vec<PlannedNote>, SyncError> {
    let mut planned = Vec::new();
    for name in list_candidates(vault, mirror, notebook, settings).await? {
        let note = NoteRef::new(notebook, name)?;
        let local = filesystem::mtime_ms(&vault.note_path(&note)).await?;
        let remote = filesystem::mtime_ms(&mirror.note_path(&note)).await?;
        let action = plan(local, remote);
        if action != SyncAction::None {
            debug!(note = %note, action = ?action, local, remote, "planned");
        }
        planned.push(PlannedNote {
            note,
            action,
            both_exist: local.is_some() && remote.is_some(),
        });
    }
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_plan_one_sided() {
        assert_eq!(plan(Some(5), None), SyncAction::PushToRemote);
        assert_eq!(plan(None, Some(5)), SyncAction::PullFromRemote);
        assert_eq!(plan(None, None), SyncAction::None);
    }

    #[test]
    fn test_plan_newer_side_wins() {
        assert_eq!(plan(Some(10), Some(5)), SyncAction::PushToRemote);
        assert_eq!(plan(Some(5), Some(10)), SyncAction::PullFromRemote);
        assert_eq!(plan(Some(7), Some(7)), SyncAction::None);
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    #[tokio::test]
    async fn test_candidates_union_and_filters() {
        let local = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        touch(local.path(), "A/a.md");
        touch(local.path(), "A/.hidden.md");
        touch(local.path(), "A/backup.md~");
        touch(local.path(), "A/image.PNG");
        touch(remote.path(), "A/b.TXT");
        touch(remote.path(), "A/a.md");
        std::fs::create_dir_all(local.path().join("A/a.md.attachments")).unwrap();
        std::fs::create_dir_all(local.path().join("A/folder.md")).unwrap();

        let vault = Replica::local(local.path());
        let mirror = Replica::remote(remote.path());
        let names = list_candidates(&vault, &mirror, "A", &SyncConfig::default())
            .await
            .unwrap();

        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["a.md".to_string(), "b.TXT".to_string()]
        );
    }

    #[tokio::test]
    async fn test_plan_notebook_marks_one_sided_notes() {
        let local = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        touch(local.path(), "A/only-local.md");
        touch(remote.path(), "A/only-remote.md");

        let vault = Replica::local(local.path());
        let mirror = Replica::remote(remote.path());
        let planned = plan_notebook(&vault, &mirror, "A", &SyncConfig::default())
            .await
            .unwrap();

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].note.file_name(), "only-local.md");
        assert_eq!(planned[0].action, SyncAction::PushToRemote);
        assert!(!planned[0].both_exist);
        assert_eq!(planned[1].action, SyncAction::PullFromRemote);
    }
}
