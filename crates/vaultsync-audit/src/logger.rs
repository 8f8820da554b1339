//! ActionLog - the vault's `.synclog` audit trail
//!
//! Appends one line per file-system action the engine performs on behalf
//! of the user. All methods are non-fatal: write failures are logged via
//! `tracing::warn!` but never propagated.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use vaultsync_core::domain::{ActionEntry, ActionKind, Replica};

/// Appender for the action log.
///
/// Lines are written whole under an internal lock so concurrent callers
/// never interleave.
#[derive(Debug)]
pub struct ActionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ActionLog {
    /// Creates an `ActionLog` writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates an `ActionLog` at the vault's standard location.
    pub fn for_vault(vault: &Replica) -> Self {
        Self::new(vault.sync_log_path())
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, swallowing errors with a tracing warning.
    pub async fn append(&self, entry: &ActionEntry) {
        let _guard = self.write_lock.lock().await;
        let line = format!("{}\n", entry.to_line());
        if let Err(e) = self.write_line(&line).await {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to write action log entry"
            );
        }
    }

    async fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    fn entry(kind: ActionKind, path: &Path) -> ActionEntry {
        ActionEntry::new(
            Utc::now().timestamp_millis(),
            kind,
            path.display().to_string(),
        )
    }

    // ========================================================================
    // Entry kinds
    // ========================================================================

    /// Log creation of a notebook directory.
    pub async fn log_new(&self, notebook_dir: &Path) {
        self.append(&Self::entry(ActionKind::New, notebook_dir)).await;
    }

    /// Log deletion of a note.
    pub async fn log_delete(&self, note: &Path) {
        self.append(&Self::entry(ActionKind::Delete, note)).await;
    }

    /// Log a note copied from `source` onto `destination`.
    pub async fn log_copy(&self, source: &Path, destination: &Path) {
        let entry = Self::entry(ActionKind::Copy, source)
            .with_destination(destination.display().to_string());
        self.append(&entry).await;
    }

    /// Log a note moved from `source` to `destination`.
    pub async fn log_move(&self, source: &Path, destination: &Path) {
        let entry = Self::entry(ActionKind::Move, source)
            .with_destination(destination.display().to_string());
        self.append(&entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn read_lines(path: &Path) -> Vec<String> {
        tokio::fs::read_to_string(path)
            .await
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_log_new_and_delete() {
        let dir = TempDir::new().unwrap();
        let log = ActionLog::new(dir.path().join(".synclog"));

        log.log_new(Path::new("/v/Travel")).await;
        log.log_delete(Path::new("/m/A/x.md")).await;

        let lines = read_lines(log.path()).await;
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(",NEW,/v/Travel"));
        assert!(lines[1].ends_with(",DEL,/m/A/x.md"));
    }

    #[tokio::test]
    async fn test_log_copy_and_move_carry_destination() {
        let dir = TempDir::new().unwrap();
        let log = ActionLog::new(dir.path().join(".synclog"));

        log.log_copy(Path::new("/v/A/x.md"), Path::new("/m/A/x.md")).await;
        log.log_move(Path::new("/v/A/x.md"), Path::new("/v/B/x.md")).await;

        let lines = read_lines(log.path()).await;
        let copy = ActionEntry::parse_line(&lines[0]).unwrap();
        assert_eq!(copy.kind(), ActionKind::Copy);
        assert_eq!(copy.destination(), Some("/m/A/x.md"));
        assert!(copy.timestamp_ms() > 0);

        let mv = ActionEntry::parse_line(&lines[1]).unwrap();
        assert_eq!(mv.kind(), ActionKind::Move);
        assert_eq!(mv.path(), "/v/A/x.md");
        assert_eq!(mv.destination(), Some("/v/B/x.md"));
    }

    #[tokio::test]
    async fn test_appends_to_existing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".synclog");
        tokio::fs::write(&path, "1,NEW,/v/Old\n").await.unwrap();

        let log = ActionLog::new(&path);
        log.log_new(Path::new("/v/New")).await;

        let lines = read_lines(&path).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1,NEW,/v/Old");
    }

    #[tokio::test]
    async fn test_write_failure_is_non_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, "file").await.unwrap();

        // Parent is a regular file, so every open fails.
        let log = ActionLog::new(blocker.join(".synclog"));
        log.log_new(Path::new("/v/A")).await;
        log.log_move(Path::new("/a"), Path::new("/b")).await;
    }

    #[test]
    fn test_for_vault_uses_standard_path() {
        let vault = Replica::local("/home/u/Notes");
        let log = ActionLog::for_vault(&vault);
        assert_eq!(log.path(), Path::new("/home/u/Notes/.synclog"));
    }
}
