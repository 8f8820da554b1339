//! Follow-up view policy
//!
//! After reconciliation the note list may switch to a transient view.
//! Conflicts win over updates. With neither, a transient view left over
//! from an earlier pass is replaced by the default notebook.

use tracing::trace;
use vaultsync_core::domain::{NoteRef, ResultSet};
use vaultsync_core::ports::ResultView;

/// Decides which view to show after a pass
pub struct ResultViewPolicy;

impl ResultViewPolicy {
    /// Returns the view to switch to, or `None` to leave the UI alone.
    pub fn decide(
        conflicts: &[NoteRef],
        updated: &[NoteRef],
        showing_result_view: bool,
    ) -> Option<ResultView> {
        if !conflicts.is_empty() {
            trace!(count = conflicts.len(), "Showing conflict view");
            return Some(ResultView::Show(ResultSet::conflicts(conflicts.to_vec())));
        }
        if !updated.is_empty() {
            trace!(count = updated.len(), "Showing updated view");
            return Some(ResultView::Show(ResultSet::updated(updated.to_vec())));
        }
        if showing_result_view {
            return Some(ResultView::DefaultNotebook);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultsync_core::domain::ResultSetKind;

    fn notes(names: &[&str]) -> Vec<NoteRef> {
        names
            .iter()
            .map(|n| NoteRef::new("A", *n).unwrap())
            .collect()
    }

    #[test]
    fn test_conflicts_win_over_updates() {
        let view = ResultViewPolicy::decide(&notes(&["a.md"]), &notes(&["b.md", "c.md"]), false);
        match view {
            Some(ResultView::Show(set)) => {
                assert_eq!(set.kind(), ResultSetKind::Conflict);
                assert_eq!(set.title(), "Conflict (1)");
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_updates_shown_without_conflicts() {
        let view = ResultViewPolicy::decide(&[], &notes(&["b.md", "c.md"]), true);
        match view {
            Some(ResultView::Show(set)) => assert_eq!(set.title(), "Updated (2)"),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_reverts_stale_result_view() {
        assert_eq!(
            ResultViewPolicy::decide(&[], &[], true),
            Some(ResultView::DefaultNotebook)
        );
    }

    #[test]
    fn test_leaves_ui_alone_when_nothing_to_show() {
        assert_eq!(ResultViewPolicy::decide(&[], &[], false), None);
    }
}
