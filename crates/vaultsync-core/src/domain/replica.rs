//! Replica layout
//!
//! Both the local vault and the remote mirror share one on-disk layout:
//!
//! ```text
//! <root>/<notebook>/<file>                      note
//! <root>/<notebook>/<file>.attachments/         attachments
//! <root>/.meta/<notebook>_<file>                meta record
//! <root>/.retained/<file>                       single-slot retained copy
//! <root>/.events/*.json                         mobile commands (remote only)
//! <root>/.searchIndex.gz                        search export (remote only)
//! <root>/.synclog                               action log (local only)
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::action::Side;
use super::newtypes::NoteRef;

/// Directory holding meta records
pub const META_DIR: &str = ".meta";
/// Directory holding retained copies
pub const RETAINED_DIR: &str = ".retained";
/// Directory polled for mobile event files
pub const EVENTS_DIR: &str = ".events";
/// Suffix appended to a note file name to form its attachments folder
pub const ATTACHMENTS_SUFFIX: &str = ".attachments";
/// Action log file name
pub const SYNC_LOG_FILE: &str = ".synclog";
/// Search index export file name
pub const SEARCH_INDEX_FILE: &str = ".searchIndex.gz";
/// Notebook that holds deleted notes
pub const TRASH_NOTEBOOK: &str = "Trash";

/// One side of the synchronization: a root directory plus its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    side: Side,
    root: PathBuf,
}

impl Replica {
    /// The local vault rooted at `root`
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            side: Side::Local,
            root: root.into(),
        }
    }

    /// The remote mirror rooted at `root`
    pub fn remote(root: impl Into<PathBuf>) -> Self {
        Self {
            side: Side::Remote,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notebook_dir(&self, notebook: &str) -> PathBuf {
        self.root.join(notebook)
    }

    pub fn note_path(&self, note: &NoteRef) -> PathBuf {
        self.notebook_dir(note.notebook()).join(note.file_name())
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(META_DIR)
    }

    pub fn meta_path(&self, note: &NoteRef) -> PathBuf {
        self.meta_dir().join(note.meta_key())
    }

    pub fn attachments_path(&self, note: &NoteRef) -> PathBuf {
        attachments_for(&self.note_path(note))
    }

    pub fn retained_dir(&self) -> PathBuf {
        self.root.join(RETAINED_DIR)
    }

    pub fn events_dir(&self) -> PathBuf {
        self.root.join(EVENTS_DIR)
    }

    pub fn sync_log_path(&self) -> PathBuf {
        self.root.join(SYNC_LOG_FILE)
    }

    pub fn search_index_path(&self) -> PathBuf {
        self.root.join(SEARCH_INDEX_FILE)
    }

    /// Path below the root with a leading `/` and forward slashes
    /// (`/Work/plan.md`). `None` if `path` is outside the root.
    pub fn relative_display(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut out = String::new();
        for part in rel.components() {
            out.push('/');
            out.push_str(&part.as_os_str().to_string_lossy());
        }
        Some(out)
    }
}

/// Attachments folder belonging to a note file path
pub fn attachments_for(note_path: &Path) -> PathBuf {
    let mut s = note_path.as_os_str().to_owned();
    s.push(ATTACHMENTS_SUFFIX);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let vault = Replica::local("/home/u/Notes");
        let note = NoteRef::new("Work", "plan.md").unwrap();

        assert_eq!(vault.side(), Side::Local);
        assert_eq!(vault.note_path(&note), PathBuf::from("/home/u/Notes/Work/plan.md"));
        assert_eq!(
            vault.meta_path(&note),
            PathBuf::from("/home/u/Notes/.meta/Work_plan.md")
        );
        assert_eq!(
            vault.attachments_path(&note),
            PathBuf::from("/home/u/Notes/Work/plan.md.attachments")
        );
        assert_eq!(vault.retained_dir(), PathBuf::from("/home/u/Notes/.retained"));
        assert_eq!(vault.sync_log_path(), PathBuf::from("/home/u/Notes/.synclog"));
    }

    #[test]
    fn remote_layout_paths() {
        let mirror = Replica::remote("/m/Apps/Elephant");
        assert_eq!(mirror.side(), Side::Remote);
        assert_eq!(mirror.events_dir(), PathBuf::from("/m/Apps/Elephant/.events"));
        assert_eq!(
            mirror.search_index_path(),
            PathBuf::from("/m/Apps/Elephant/.searchIndex.gz")
        );
    }

    #[test]
    fn relative_display_uses_forward_slashes() {
        let vault = Replica::local("/v");
        assert_eq!(
            vault.relative_display(Path::new("/v/A/x.md")),
            Some("/A/x.md".to_string())
        );
        assert_eq!(vault.relative_display(Path::new("/elsewhere/x.md")), None);
    }
}
