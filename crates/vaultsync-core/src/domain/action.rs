//! Sync action domain types
//!
//! This module defines the per-note decision produced by the planner and
//! the entries recorded in the vault's `.synclog` action log.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Which replica a file or directory lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The user's vault on this machine
    Local,
    /// The mirror folder managed by the file-sync provider
    Remote,
}

impl Side {
    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Remote => write!(f, "remote"),
        }
    }
}

/// Decision for one note in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Both copies carry the same modification time
    None,
    /// Remote is newer (or local is missing): copy remote onto local
    PullFromRemote,
    /// Local is newer (or remote is missing): copy local onto remote
    PushToRemote,
}

impl SyncAction {
    /// Side that is read from, if any
    pub fn source(self) -> Option<Side> {
        match self {
            SyncAction::None => None,
            SyncAction::PullFromRemote => Some(Side::Remote),
            SyncAction::PushToRemote => Some(Side::Local),
        }
    }

    /// Side that is overwritten, if any
    pub fn destination(self) -> Option<Side> {
        self.source().map(Side::opposite)
    }
}

/// Kind of an action-log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    /// Notebook created
    New,
    /// Note deleted or moved to trash
    #[serde(rename = "DEL")]
    Delete,
    /// Note copied between replicas
    Copy,
    /// Note moved or renamed
    Move,
}

impl ActionKind {
    /// Token written to the log
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::New => "NEW",
            ActionKind::Delete => "DEL",
            ActionKind::Copy => "COPY",
            ActionKind::Move => "MOVE",
        }
    }

    /// Whether lines of this kind carry a destination path
    pub fn has_destination(self) -> bool {
        matches!(self, ActionKind::Copy | ActionKind::Move)
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(ActionKind::New),
            "DEL" => Ok(ActionKind::Delete),
            "COPY" => Ok(ActionKind::Copy),
            "MOVE" => Ok(ActionKind::Move),
            other => Err(DomainError::InvalidLogLine(format!("unknown kind: {other}"))),
        }
    }
}

/// One line of the action log: `<millis>,<KIND>,<path>[,<destination>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    timestamp_ms: i64,
    kind: ActionKind,
    path: String,
    dest: Option<String>,
}

impl ActionEntry {
    pub fn new(timestamp_ms: i64, kind: ActionKind, path: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind,
            path: path.into(),
            dest: None,
        }
    }

    pub fn with_destination(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn destination(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    /// Render the entry without the trailing newline
    pub fn to_line(&self) -> String {
        match &self.dest {
            Some(dest) => format!("{},{},{},{}", self.timestamp_ms, self.kind, self.path, dest),
            None => format!("{},{},{}", self.timestamp_ms, self.kind, self.path),
        }
    }

    /// Parse one log line.
    ///
    /// For COPY and MOVE the destination is taken after the last comma, so
    /// commas inside the source path survive.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidLogLine` for malformed lines.
    pub fn parse_line(line: &str) -> Result<Self, DomainError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut parts = line.splitn(3, ',');
        let (Some(ts), Some(kind), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(DomainError::InvalidLogLine(line.to_string()));
        };
        let timestamp_ms = ts
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::InvalidLogLine(format!("bad timestamp: {line}")))?;
        let kind: ActionKind = kind.trim().parse()?;

        if kind.has_destination() {
            let (path, dest) = rest
                .rsplit_once(',')
                .ok_or_else(|| DomainError::InvalidLogLine(format!("missing destination: {line}")))?;
            Ok(Self::new(timestamp_ms, kind, path).with_destination(dest))
        } else {
            Ok(Self::new(timestamp_ms, kind, rest))
        }
    }
}

impl Display for ActionEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_action_sides() {
        assert_eq!(SyncAction::None.source(), None);
        assert_eq!(SyncAction::PullFromRemote.source(), Some(Side::Remote));
        assert_eq!(SyncAction::PullFromRemote.destination(), Some(Side::Local));
        assert_eq!(SyncAction::PushToRemote.destination(), Some(Side::Remote));
    }

    #[test]
    fn test_action_kind_tokens() {
        assert_eq!(ActionKind::Delete.to_string(), "DEL");
        assert_eq!("MOVE".parse::<ActionKind>().unwrap(), ActionKind::Move);
        assert!("RENAME".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_entry_lines() {
        let entry = ActionEntry::new(1000, ActionKind::New, "/v/Work");
        assert_eq!(entry.to_line(), "1000,NEW,/v/Work");

        let entry = ActionEntry::new(1001, ActionKind::Copy, "/v/A/x.md").with_destination("/m/A/x.md");
        assert_eq!(entry.to_line(), "1001,COPY,/v/A/x.md,/m/A/x.md");
    }

    #[test]
    fn test_parse_line() {
        let entry = ActionEntry::parse_line("1700000000000,MOVE,/v/A/a,b.md,/v/B/c.md\n").unwrap();
        assert_eq!(entry.timestamp_ms(), 1_700_000_000_000);
        assert_eq!(entry.kind(), ActionKind::Move);
        assert_eq!(entry.path(), "/v/A/a,b.md");
        assert_eq!(entry.destination(), Some("/v/B/c.md"));

        let entry = ActionEntry::parse_line("5,DEL,/v/A/x, y.md").unwrap();
        assert_eq!(entry.path(), "/v/A/x, y.md");
        assert_eq!(entry.destination(), None);
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(ActionEntry::parse_line("").is_err());
        assert!(ActionEntry::parse_line("abc,NEW,/v").is_err());
        assert!(ActionEntry::parse_line("1,COPY,/only-one").is_err());
        assert!(ActionEntry::parse_line("1,WHAT,/v").is_err());
    }
}
