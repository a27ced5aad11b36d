//! Editing session state
//!
//! `Session` is the synchronous state machine behind the editor: a committed
//! copy (last known saved), a working copy (live candidate), the Viewing /
//! Editing mode and the bookkeeping around saves. Mutations always replace the
//! working copy with a new tree value.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::client::GatewayError;
use crate::models::{GroupKey, MoveRecord, NavTree};
use crate::reorder::{self, Drag, ReorderError};

// Define the maximum size for the history buffer
const MAX_HISTORY_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Viewing,
    Editing,
}

/// What happened to a save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The gateway accepted the tree
    Saved,
    /// Accepted locally only; the session is in degraded mode
    SavedOffline,
    /// The gateway rejected the tree. Editing continues.
    Failed(String),
    /// Another save is still in flight
    AlreadySaving,
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Saved | SaveOutcome::SavedOffline)
    }
}

/// Represents a single state transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: Option<String>,
}

impl TransitionLogEntry {
    pub fn new(action: String, details: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            details,
        }
    }
}

pub struct Session {
    committed: NavTree,
    working: NavTree,
    mode: Mode,
    degraded: bool,
    saving: bool,
    notice: Option<String>,
    pressed: Option<String>,
    history: VecDeque<TransitionLogEntry>,
}

impl Session {
    /// Starts a session over a tree loaded from the gateway
    pub fn new(tree: NavTree) -> Self {
        Self {
            committed: tree.clone(),
            working: tree,
            mode: Mode::Viewing,
            degraded: false,
            saving: false,
            notice: None,
            pressed: None,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Starts a session in degraded mode, typically over the seed tree
    pub fn offline(tree: NavTree) -> Self {
        let mut session = Self::new(tree);
        session.enter_degraded();
        session
    }

    /// Logs a state transition, maintaining the history buffer size.
    fn log_transition(&mut self, action: &str, details: Option<String>) {
        tracing::debug!(action, details = details.as_deref().unwrap_or(""), "session");
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history
            .push_back(TransitionLogEntry::new(action.to_string(), details));
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == Mode::Editing
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn working(&self) -> &NavTree {
        &self.working
    }

    pub fn committed(&self) -> &NavTree {
        &self.committed
    }

    /// True when the working copy differs from the committed copy
    pub fn is_dirty(&self) -> bool {
        self.working != self.committed
    }

    /// The user-facing error notice. Suppressed in degraded mode.
    pub fn notice(&self) -> Option<&str> {
        if self.degraded {
            None
        } else {
            self.notice.as_deref()
        }
    }

    /// The row currently held down, if any
    pub fn pressed(&self) -> Option<&str> {
        self.pressed.as_deref()
    }

    /// Recent state transitions, oldest first
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionLogEntry> {
        self.history.iter()
    }

    // Mode transitions

    /// Viewing -> Editing. Returns false when already editing.
    pub fn enter_edit(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        self.mode = Mode::Editing;
        self.log_transition("enter_edit", None);
        true
    }

    /// Editing -> Viewing without touching either copy
    pub fn exit_edit(&mut self) {
        if self.is_editing() {
            self.mode = Mode::Viewing;
            self.log_transition("exit_edit", None);
        }
    }

    /// Flips the mode, as the explicit edit control does
    pub fn toggle_edit(&mut self) -> Mode {
        if self.is_editing() {
            self.exit_edit();
        } else {
            self.enter_edit();
        }
        self.mode
    }

    pub fn press_started(&mut self, item_id: &str) {
        self.pressed = Some(item_id.to_string());
    }

    pub fn press_ended(&mut self) {
        self.pressed = None;
    }

    // Mutations

    fn replace_working(&mut self, next: NavTree, action: &str, details: String) -> bool {
        if next == self.working {
            return false;
        }
        self.working = next;
        self.log_transition(action, Some(details));
        true
    }

    /// Moves an item within one sibling group of the working copy
    pub fn move_item(
        &mut self,
        group: &GroupKey,
        from: usize,
        to: usize,
    ) -> Result<Option<MoveRecord>, ReorderError> {
        let outcome = reorder::move_item(&self.working, group, from, to)?;
        if outcome.changed() {
            self.replace_working(
                outcome.tree,
                "move",
                format!("{} {} -> {}", group, from, to),
            );
        }
        Ok(outcome.record)
    }

    /// Applies a drag from the gesture layer
    pub fn apply_drag(&mut self, drag: &Drag) -> Result<Option<MoveRecord>, ReorderError> {
        let outcome = reorder::apply_drag(&self.working, drag)?;
        if outcome.changed() {
            self.replace_working(
                outcome.tree,
                "move",
                format!("{} {} -> {}", drag.source, drag.from, drag.to),
            );
        }
        Ok(outcome.record)
    }

    /// Returns true when the working copy changed
    pub fn set_visibility(&mut self, id: &str, visible: bool) -> bool {
        let next = self.working.set_visibility(id, visible);
        self.replace_working(next, "set_visibility", format!("{} -> {}", id, visible))
    }

    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        let next = self.working.toggle_visibility(id);
        self.replace_working(next, "toggle_visibility", id.to_string())
    }

    pub fn set_title(&mut self, id: &str, title: &str) -> bool {
        let next = self.working.set_title(id, title);
        self.replace_working(next, "set_title", format!("{} -> '{}'", id, title))
    }

    // Commit and revert

    /// Resets the working copy to the committed copy and returns to Viewing.
    ///
    /// Returns false, leaving everything untouched, while a save is outstanding.
    pub fn discard(&mut self) -> bool {
        if self.saving {
            self.log_transition("discard_refused", Some("save in flight".to_string()));
            return false;
        }
        self.working = self.committed.clone();
        self.mode = Mode::Viewing;
        self.notice = None;
        self.log_transition("discard", None);
        true
    }

    /// Claims the save slot and snapshots the working copy.
    ///
    /// `None` while another save is outstanding.
    pub fn begin_save(&mut self) -> Option<NavTree> {
        if self.saving {
            return None;
        }
        self.saving = true;
        self.notice = None;
        self.log_transition("begin_save", None);
        Some(self.working.clone())
    }

    /// Settles a save started with `begin_save`.
    ///
    /// A connectivity failure switches the session to degraded mode and
    /// counts as a local save.
    pub fn finish_save(
        &mut self,
        snapshot: NavTree,
        result: Result<(), GatewayError>,
    ) -> SaveOutcome {
        self.saving = false;
        let outcome = match result {
            Ok(()) if self.degraded => SaveOutcome::SavedOffline,
            Ok(()) => SaveOutcome::Saved,
            Err(e) if e.is_unavailable() => {
                tracing::info!("backend unavailable during save, continuing offline: {}", e);
                self.enter_degraded();
                SaveOutcome::SavedOffline
            }
            Err(e) => SaveOutcome::Failed(e.to_string()),
        };

        match &outcome {
            SaveOutcome::Failed(message) => {
                self.notice = Some(message.clone());
                self.log_transition("save_failed", Some(message.clone()));
            }
            _ => {
                self.committed = snapshot;
                self.mode = Mode::Viewing;
                self.log_transition("save", None);
            }
        }
        outcome
    }

    // Loading

    /// Replaces both copies after a successful (re)fetch
    pub fn replace_tree(&mut self, tree: NavTree) {
        self.committed = tree.clone();
        self.working = tree;
        self.notice = None;
        self.log_transition("load", None);
    }

    pub fn set_notice(&mut self, message: String) {
        self.log_transition("notice", Some(message.clone()));
        self.notice = Some(message);
    }

    pub fn enter_degraded(&mut self) {
        if !self.degraded {
            self.degraded = true;
            self.log_transition("degraded", None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_tree;
    use pretty_assertions::assert_eq;

    fn editing_session() -> Session {
        let mut session = Session::new(seed_tree());
        session.enter_edit();
        session
    }

    #[test]
    fn test_mode_transitions() {
        let mut session = Session::new(seed_tree());
        assert_eq!(session.mode(), Mode::Viewing);

        assert!(session.enter_edit());
        assert!(!session.enter_edit());
        assert_eq!(session.toggle_edit(), Mode::Viewing);
        assert_eq!(session.toggle_edit(), Mode::Editing);
        session.exit_edit();
        assert!(!session.is_editing());
    }

    #[test]
    fn test_discard_restores_committed() {
        let mut session = editing_session();
        session.move_item(&GroupKey::TopLevel, 0, 2).unwrap();
        session.set_title("2-1", "Jane Roe");
        session.toggle_visibility("3");
        assert!(session.is_dirty());

        assert!(session.discard());

        assert_eq!(session.working(), &seed_tree());
        assert!(!session.is_dirty());
        assert_eq!(session.mode(), Mode::Viewing);
    }

    #[test]
    fn test_mutations_not_blocked_while_viewing() {
        let mut session = Session::new(seed_tree());

        assert!(session.set_visibility("2-2", true));
        assert!(session.is_dirty());
        assert_eq!(session.mode(), Mode::Viewing);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut session = editing_session();

        assert!(!session.set_title("nope", "x"));
        assert!(!session.set_visibility("nope", false));
        assert!(!session.toggle_visibility("nope"));
        assert_eq!(
            session
                .move_item(&GroupKey::children_of("nope"), 0, 1)
                .unwrap(),
            None
        );
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_move_returns_record() {
        let mut session = editing_session();
        let record = session
            .move_item(&GroupKey::TopLevel, 2, 0)
            .unwrap()
            .unwrap();

        assert_eq!(record.item_id, "3");
        assert_eq!(session.working().ids()[0], "3");
    }

    #[test]
    fn test_cross_group_drag_leaves_working_copy() {
        let mut session = editing_session();
        let drag = Drag {
            source: GroupKey::children_of("2"),
            destination: GroupKey::TopLevel,
            from: 0,
            to: 0,
        };

        assert!(session.apply_drag(&drag).is_err());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_save_success_commits_snapshot() {
        let mut session = editing_session();
        session.set_title("1", "Home");

        let snapshot = session.begin_save().unwrap();
        assert!(session.begin_save().is_none(), "second save must be rejected");

        let outcome = session.finish_save(snapshot, Ok(()));

        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(session.committed().find_node("1").unwrap().title(), "Home");
        assert!(!session.is_dirty());
        assert_eq!(session.mode(), Mode::Viewing);
        assert!(!session.is_saving());
    }

    #[test]
    fn test_save_failure_keeps_state() {
        let mut session = editing_session();
        session.set_title("1", "Home");
        let working_before = session.working().clone();

        let snapshot = session.begin_save().unwrap();
        let outcome = session.finish_save(
            snapshot,
            Err(GatewayError::Server {
                status: 500,
                reason: "Internal Server Error".to_string(),
            }),
        );

        assert_eq!(
            outcome,
            SaveOutcome::Failed("Server error: 500 - Internal Server Error".to_string())
        );
        assert_eq!(session.committed(), &seed_tree());
        assert_eq!(session.working(), &working_before);
        assert!(session.is_editing());
        assert_eq!(
            session.notice(),
            Some("Server error: 500 - Internal Server Error")
        );

        // the user may retry
        assert!(session.begin_save().is_some());
    }

    #[test]
    fn test_discard_refused_while_saving() {
        let mut session = editing_session();
        session.set_title("1", "Home");
        let snapshot = session.begin_save().unwrap();

        assert!(!session.discard());
        assert!(session.is_editing());
        assert_eq!(session.working().find_node("1").unwrap().title(), "Home");

        session.finish_save(snapshot, Ok(()));

        assert!(!session.is_dirty());
        assert_eq!(session.committed().find_node("1").unwrap().title(), "Home");
        assert!(session.discard());
    }

    #[test]
    fn test_unavailable_during_save_goes_offline() {
        let mut session = editing_session();
        session.toggle_visibility("1");

        let snapshot = session.begin_save().unwrap();
        let outcome = session.finish_save(
            snapshot,
            Err(GatewayError::Unavailable("refused".to_string())),
        );

        assert_eq!(outcome, SaveOutcome::SavedOffline);
        assert!(session.is_degraded());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_notice_suppressed_when_degraded() {
        let mut session = Session::offline(seed_tree());
        session.set_notice("Server error: 502 - Bad Gateway".to_string());

        assert!(session.notice().is_none());
    }

    #[test]
    fn test_transition_history_bounded() {
        let mut session = editing_session();
        for i in 0..MAX_HISTORY_SIZE + 5 {
            session.set_title("1", &format!("Title {}", i));
        }

        assert_eq!(session.transitions().count(), MAX_HISTORY_SIZE);
        assert_eq!(session.transitions().last().unwrap().action, "set_title");
    }
}
