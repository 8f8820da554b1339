//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for note identities and
//! content hashes. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Name helpers
// ============================================================================

/// Reduce an untrusted name to its final path component.
///
/// `"../../etc/passwd"` becomes `"passwd"` and `"Work\\Plans"` becomes
/// `"Plans"`. Returns `None` when nothing usable remains.
pub fn bare_name(raw: &str) -> Option<String> {
    let last = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if last.is_empty() || last == "." || last == ".." {
        None
    } else {
        Some(last.to_string())
    }
}

fn validate_component(kind: &str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::InvalidName(format!("{kind} cannot be empty")));
    }
    if value == "." || value == ".." || value.contains('/') || value.contains('\\') {
        return Err(DomainError::InvalidName(format!(
            "{kind} must be a single path component: {value}"
        )));
    }
    Ok(())
}

// ============================================================================
// NoteRef
// ============================================================================

/// Identity of a note for sync purposes: `(notebook, file name)`.
///
/// Content plays no part in identity. The same `NoteRef` addresses the note
/// on both the local vault and the remote mirror.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteRef {
    notebook: String,
    file_name: String,
}

impl NoteRef {
    /// Create a new NoteRef
    ///
    /// # Errors
    /// Returns `DomainError::InvalidName` if either part is empty or contains
    /// a path separator.
    pub fn new(notebook: impl Into<String>, file_name: impl Into<String>) -> Result<Self, DomainError> {
        let notebook = notebook.into();
        let file_name = file_name.into();
        validate_component("notebook name", &notebook)?;
        validate_component("note file name", &file_name)?;
        Ok(Self {
            notebook,
            file_name,
        })
    }

    /// Derive a NoteRef from a note file path (`.../<notebook>/<file>`).
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path has no parent directory
    /// name or no file name.
    pub fn from_note_path(path: &Path) -> Result<Self, DomainError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DomainError::InvalidPath(path.display().to_string()))?;
        let notebook = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .ok_or_else(|| DomainError::InvalidPath(path.display().to_string()))?;
        Self::new(notebook, file_name)
    }

    #[must_use]
    pub fn notebook(&self) -> &str {
        &self.notebook
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Key of the note's sidecar meta record: `<notebook>_<file name>`.
    #[must_use]
    pub fn meta_key(&self) -> String {
        format!("{}_{}", self.notebook, self.file_name)
    }

    /// Same note file name in another notebook.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidName` for an invalid notebook name.
    pub fn in_notebook(&self, notebook: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(notebook, self.file_name.clone())
    }

    /// Same notebook, different file name.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidName` for an invalid file name.
    pub fn renamed(&self, file_name: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(self.notebook.clone(), file_name)
    }
}

impl Display for NoteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.notebook, self.file_name)
    }
}

// ============================================================================
// ContentHash
// ============================================================================

/// Provider-compatible content hash: 32 bytes rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of the hex rendering (SHA-256 digest)
    pub const HEX_LEN: usize = 64;

    /// Create a new ContentHash
    ///
    /// Upper-case hex is accepted and normalized to lower case.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidHash` if the value is not 64 hex digits.
    pub fn new(hash: impl Into<String>) -> Result<Self, DomainError> {
        let hash = hash.into().trim().to_ascii_lowercase();
        if hash.len() != Self::HEX_LEN {
            return Err(DomainError::InvalidHash(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                hash.len()
            )));
        }
        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidHash(format!("not hexadecimal: {hash}")));
        }
        Ok(Self(hash))
    }

    /// Render a raw SHA-256 digest
    #[must_use]
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentHash {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

// ============================================================================
// Relative paths carried by event files
// ============================================================================

/// Resolve a forward-slash relative path (`"/Work/note.md"`) under `root`.
///
/// Separators are normalized to the platform's. Parent (`..`) and absolute
/// components are rejected so event files cannot escape `root`.
///
/// # Errors
/// Returns `DomainError::InvalidPath` for empty or escaping paths.
pub fn resolve_relative(root: &Path, relative: &str) -> Result<PathBuf, DomainError> {
    let mut resolved = root.to_path_buf();
    let mut pushed = 0usize;
    for part in relative.split(['/', '\\']) {
        if part.is_empty() || part == "." {
            continue;
        }
        match Path::new(part).components().next() {
            Some(Component::Normal(_)) if Path::new(part).components().count() == 1 => {
                resolved.push(part);
                pushed += 1;
            }
            _ => {
                return Err(DomainError::InvalidPath(format!(
                    "relative path escapes root: {relative}"
                )))
            }
        }
    }
    if pushed == 0 {
        return Err(DomainError::InvalidPath(format!(
            "relative path is empty: {relative:?}"
        )));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_strips_directories() {
        assert_eq!(bare_name("Work"), Some("Work".to_string()));
        assert_eq!(bare_name("../../etc/passwd"), Some("passwd".to_string()));
        assert_eq!(bare_name("a\\b\\Plans"), Some("Plans".to_string()));
        assert_eq!(bare_name("trailing/"), None);
        assert_eq!(bare_name(".."), None);
        assert_eq!(bare_name("   "), None);
    }

    #[test]
    fn note_ref_validation() {
        assert!(NoteRef::new("Work", "plan.md").is_ok());
        assert!(NoteRef::new("", "plan.md").is_err());
        assert!(NoteRef::new("Work", "").is_err());
        assert!(NoteRef::new("Wo/rk", "plan.md").is_err());
        assert!(NoteRef::new("Work", "..").is_err());
    }

    #[test]
    fn note_ref_from_path_and_meta_key() {
        let note = NoteRef::from_note_path(Path::new("/vault/Work/plan.md")).unwrap();
        assert_eq!(note.notebook(), "Work");
        assert_eq!(note.file_name(), "plan.md");
        assert_eq!(note.meta_key(), "Work_plan.md");
        assert_eq!(note.to_string(), "Work/plan.md");
    }

    #[test]
    fn note_ref_moves_and_renames() {
        let note = NoteRef::new("A", "x.md").unwrap();
        assert_eq!(note.in_notebook("B").unwrap().to_string(), "B/x.md");
        assert_eq!(note.renamed("y.md").unwrap().to_string(), "A/y.md");
    }

    #[test]
    fn content_hash_validation() {
        let valid = "a".repeat(64);
        assert!(ContentHash::new(valid.clone()).is_ok());
        assert_eq!(
            ContentHash::new("A".repeat(64)).unwrap().as_str(),
            valid.as_str()
        );
        assert!(ContentHash::new("abc").is_err());
        assert!(ContentHash::new("g".repeat(64)).is_err());
        assert_eq!(ContentHash::from_digest(&[0xab; 32]).as_str(), "ab".repeat(32));
    }

    #[test]
    fn resolve_relative_normalizes_and_rejects_escape() {
        let root = Path::new("/vault");
        assert_eq!(
            resolve_relative(root, "/A/x.md").unwrap(),
            PathBuf::from("/vault/A/x.md")
        );
        assert_eq!(
            resolve_relative(root, ".meta/A_x.md").unwrap(),
            PathBuf::from("/vault/.meta/A_x.md")
        );
        assert!(resolve_relative(root, "/A/../../etc").is_err());
        assert!(resolve_relative(root, "").is_err());
        assert!(resolve_relative(root, "/").is_err());
    }
}
