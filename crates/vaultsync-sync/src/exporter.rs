//! Search index exporter
//!
//! Builds an inverted index of the enrolled notebooks for the companion
//! app and writes it gzipped to `<mirror>/.searchIndex.gz`:
//!
//! ```json
//! {"words":{"token":[0,3]},"notes":["/Work/plan.md", ...]}
//! ```
//!
//! Note indexes are positions in `notes`. Dates are indexed as
//! `date:YYYY-MM-DD` tokens (UTC).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use vaultsync_core::config::SyncConfig;
use vaultsync_core::domain::replica::TRASH_NOTEBOOK;
use vaultsync_core::domain::{NoteMeta, NoteRef, Replica};
use vaultsync_core::ports::ITagResolver;

use crate::filesystem;
use crate::SyncError;

/// Counts reported after an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub notes: usize,
    pub words: usize,
}

#[derive(Debug, Default, Serialize)]
struct SearchIndex {
    words: BTreeMap<String, BTreeSet<usize>>,
    notes: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl SearchIndex {
    /// Stable index of `path`, appending it on first sight
    fn note_index(&mut self, path: String) -> usize {
        if let Some(&i) = self.positions.get(&path) {
            return i;
        }
        let i = self.notes.len();
        self.positions.insert(path.clone(), i);
        self.notes.push(path);
        i
    }

    fn digest(&mut self, text: &str, note: usize) {
        for token in tokenize(text) {
            self.words.entry(token).or_default().insert(note);
        }
    }

    fn digest_date(&mut self, millis: i64, note: usize) {
        if let Some(date) = DateTime::<Utc>::from_timestamp_millis(millis) {
            self.words
                .entry(format!("date:{}", date.format("%Y-%m-%d")))
                .or_default()
                .insert(note);
        }
    }
}

/// Writes the companion app's search index
pub struct SearchIndexExporter {
    vault: Replica,
    mirror: Replica,
    tags: Arc<dyn ITagResolver>,
}

impl SearchIndexExporter {
    pub fn new(vault: Replica, mirror: Replica, tags: Arc<dyn ITagResolver>) -> Self {
        Self {
            vault,
            mirror,
            tags,
        }
    }

    /// Where the index is written
    pub fn output_path(&self) -> PathBuf {
        self.mirror.search_index_path()
    }

    /// Index every note of every enrolled notebook except the trash and
    /// write the gzipped result.
    ///
    /// # Errors
    /// Returns `SyncError::Io` if a notebook cannot be listed or the index
    /// cannot be written. Unreadable individual notes are skipped.
    #[instrument(skip_all)]
    pub async fn export(&self, settings: &SyncConfig) -> Result<ExportSummary, SyncError> {
        let mut index = SearchIndex::default();

        for notebook in &settings.notebooks {
            if notebook.eq_ignore_ascii_case(TRASH_NOTEBOOK) {
                continue;
            }
            for (name, is_dir) in filesystem::list_names(&self.vault.notebook_dir(notebook)).await? {
                if is_dir || !settings.is_note_file(&name) {
                    continue;
                }
                let note = NoteRef::new(notebook.as_str(), name)?;
                if let Err(e) = self.index_note(&mut index, &note).await {
                    warn!(note = %note, error = %e, "Skipping note in search index");
                }
            }
        }

        let summary = ExportSummary {
            notes: index.notes.len(),
            words: index.words.len(),
        };
        let path = self.output_path();
        let bytes = tokio::task::spawn_blocking(move || encode(&index)).await??;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| SyncError::io(&path, e))?;

        info!(
            notes = summary.notes,
            words = summary.words,
            path = %path.display(),
            "Search index exported"
        );
        Ok(summary)
    }

    async fn index_note(&self, index: &mut SearchIndex, note: &NoteRef) -> Result<(), SyncError> {
        let path = self.vault.note_path(note);
        let Some(display) = self.vault.relative_display(&path) else {
            return Ok(());
        };
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| SyncError::io(&path, e))?;
        let text = String::from_utf8_lossy(&raw);
        let meta = match tokio::fs::read_to_string(self.vault.meta_path(note)).await {
            Ok(body) => NoteMeta::parse(&body).unwrap_or_default(),
            Err(_) => NoteMeta::new(),
        };

        let i = index.note_index(display);

        let title = meta.title();
        if !title.is_empty() {
            index.digest(&title, i);
            index.digest(&format!("title:{title}"), i);
        }
        if text.starts_with("{\\rtf") {
            index.digest(&strip_rtf(&text), i);
        } else {
            index.digest(&text, i);
        }
        for tag_id in meta.tags() {
            if let Some(tag) = self.tags.resolve(&tag_id) {
                index.digest(&format!("{tag} tag:{tag} t:{tag} #{tag}"), i);
            }
        }
        let nb = note.notebook();
        index.digest(&format!("notebook:{nb} nb:{nb} @{nb}"), i);

        let created = meta.created();
        if created > 0 {
            index.digest_date(created, i);
        }
        if let Some(modified) = filesystem::mtime_ms(&path).await? {
            if modified > created {
                index.digest_date(modified, i);
            }
        }
        debug!(note = %note, "indexed");
        Ok(())
    }
}

fn encode(index: &SearchIndex) -> Result<Vec<u8>, SyncError> {
    let json = serde_json::to_vec(index)
        .map_err(|e| SyncError::io(SEARCH_INDEX_LABEL, std::io::Error::other(e)))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| SyncError::io(SEARCH_INDEX_LABEL, e))?;
    encoder
        .finish()
        .map_err(|e| SyncError::io(SEARCH_INDEX_LABEL, e))
}

const SEARCH_INDEX_LABEL: &str = "<search index>";

/// Lowercased words with surrounding punctuation trimmed. Prefix markers
/// (`#`, `@`) and `key:` forms are kept intact.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|word| {
        let trimmed = word.trim_matches(|c: char| {
            !c.is_alphanumeric() && c != '#' && c != '@' && c != ':'
        });
        let trimmed = trimmed.trim_end_matches(':');
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    })
}

/// Plain text of an RTF document: control words, groups and escapes are
/// dropped, `\par` and `\line` become line breaks.
fn strip_rtf(rtf: &str) -> String {
    let mut out = String::with_capacity(rtf.len());
    let mut chars = rtf.chars().peekable();
    // Depth of groups whose contents are not text (font tables etc.)
    let mut skip_depth: Option<usize> = None;
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' => {
                if skip_depth == Some(depth) {
                    skip_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            '\\' => {
                let mut word = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphabetic() {
                        word.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if word.is_empty() {
                    // Escaped symbol such as \{ or \\ or \'e9
                    match chars.next() {
                        Some('\'') => {
                            chars.next();
                            chars.next();
                        }
                        Some('*') => {
                            if skip_depth.is_none() {
                                skip_depth = Some(depth);
                            }
                        }
                        Some(sym) if skip_depth.is_none() => out.push(sym),
                        _ => {}
                    }
                    continue;
                }
                while let Some(&n) = chars.peek() {
                    if n == '-' || n.is_ascii_digit() {
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek() == Some(&' ') {
                    chars.next();
                }
                match word.as_str() {
                    "fonttbl" | "colortbl" | "stylesheet" | "info" | "pict" => {
                        if skip_depth.is_none() {
                            skip_depth = Some(depth);
                        }
                    }
                    "par" | "line" if skip_depth.is_none() => out.push('\n'),
                    "tab" if skip_depth.is_none() => out.push('\t'),
                    _ => {}
                }
            }
            '\r' | '\n' => {}
            other if skip_depth.is_none() => out.push(other),
            _ => {}
        }
    }
    out
}

/// Read back a gzipped index file. Used by the CLI and tests.
pub fn decode_index(path: &Path) -> Result<serde_json::Value, SyncError> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = std::fs::File::open(path).map_err(|e| SyncError::io(path, e))?;
    let mut json = String::new();
    GzDecoder::new(file)
        .read_to_string(&mut json)
        .map_err(|e| SyncError::io(path, e))?;
    serde_json::from_str(&json).map_err(|e| SyncError::io(path, std::io::Error::other(e)))
}
