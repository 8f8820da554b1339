//! Transient result views
//!
//! After a pass the UI may show a virtual notebook listing either the notes
//! the conflict guard skipped or the notes a pull overwrote.

use serde::{Deserialize, Serialize};

use super::newtypes::NoteRef;

/// Which transient view a result set feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSetKind {
    Conflict,
    Updated,
}

/// Notes shown in a transient result view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    kind: ResultSetKind,
    notes: Vec<NoteRef>,
}

impl ResultSet {
    pub fn new(kind: ResultSetKind, notes: Vec<NoteRef>) -> Self {
        Self { kind, notes }
    }

    pub fn conflicts(notes: Vec<NoteRef>) -> Self {
        Self::new(ResultSetKind::Conflict, notes)
    }

    pub fn updated(notes: Vec<NoteRef>) -> Self {
        Self::new(ResultSetKind::Updated, notes)
    }

    pub fn kind(&self) -> ResultSetKind {
        self.kind
    }

    pub fn notes(&self) -> &[NoteRef] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// View title, e.g. `Conflict (2)`
    pub fn title(&self) -> String {
        let label = match self.kind {
            ResultSetKind::Conflict => "Conflict",
            ResultSetKind::Updated => "Updated",
        };
        format!("{} ({})", label, self.notes.len())
    }
}
