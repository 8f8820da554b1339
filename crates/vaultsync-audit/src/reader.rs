//! ActionLogReader - parse `.synclog` back into typed entries

use std::path::{Path, PathBuf};

use serde::Serialize;
use vaultsync_core::domain::ActionEntry;

use crate::error::AuditError;

/// Parsed log: good entries in file order plus any malformed lines
#[derive(Debug, Default, Serialize)]
pub struct ActionLogContents {
    pub entries: Vec<ActionEntry>,
    /// Human-readable description of each line that failed to parse
    pub malformed: Vec<String>,
}

impl ActionLogContents {
    /// The last `limit` entries, oldest first
    pub fn recent(&self, limit: usize) -> &[ActionEntry] {
        let start = self.entries.len().saturating_sub(limit);
        &self.entries[start..]
    }
}

/// Reader for the action log
#[derive(Debug, Clone)]
pub struct ActionLogReader {
    path: PathBuf,
}

impl ActionLogReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole log. A missing file reads as empty.
    ///
    /// # Errors
    /// Returns `AuditError::Io` if the file exists but cannot be read.
    /// Malformed lines are collected, not returned as errors.
    pub async fn read(&self) -> Result<ActionLogContents, AuditError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ActionLogContents::default())
            }
            Err(source) => {
                return Err(AuditError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(Self::parse(&text))
    }

    /// Parse log text. Blank lines are ignored.
    pub fn parse(text: &str) -> ActionLogContents {
        let mut contents = ActionLogContents::default();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match ActionEntry::parse_line(line) {
                Ok(entry) => contents.entries.push(entry),
                Err(source) => {
                    let err = AuditError::Malformed {
                        line: idx + 1,
                        source,
                    };
                    tracing::debug!(error = %err, "Skipping action log line");
                    contents.malformed.push(err.to_string());
                }
            }
        }
        contents
    }
}
