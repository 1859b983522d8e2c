//! # History
//!
//! Linear log of committed text states with a cursor.
//!
//! ## Design
//!
//! - Every committed state is a full text snapshot plus the selection paths
//!   that went with it
//! - Undo moves the cursor back, redo moves it forward
//! - A commit truncates everything after the cursor
//! - The first event is the origin of the document and is never undone past
//!   or evicted
//!
//! Replaying an event is the caller's job. The caller must flag the replayed
//! text as programmatic so the replay does not commit itself again.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One committed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub text: String,
    pub selection: Vec<String>,
}

impl HistoryEvent {
    pub fn new(text: impl Into<String>, selection: Vec<String>) -> Self {
        Self {
            text: text.into(),
            selection,
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    events: Vec<HistoryEvent>,

    /// Index of the current event
    cursor: usize,

    /// Maximum number of retained events (0 = unlimited)
    max_events: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(200)
    }
}

impl History {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            cursor: 0,
            max_events,
        }
    }

    /// Drop every event and start over from `origin`
    pub fn reset(&mut self, origin: HistoryEvent) {
        self.events = vec![origin];
        self.cursor = 0;
    }

    /// Append a state after the cursor, discarding the redo tail.
    ///
    /// Committing the current state again is a no-op.
    pub fn commit(&mut self, event: HistoryEvent) {
        if self.current() == Some(&event) {
            return;
        }
        if self.events.is_empty() {
            self.reset(event);
            return;
        }

        self.events.truncate(self.cursor + 1);
        self.events.push(event);
        self.cursor = self.events.len() - 1;

        if self.max_events > 1 && self.events.len() > self.max_events {
            // Oldest event after the origin goes first
            self.events.remove(1);
            self.cursor -= 1;
        }
        debug!(len = self.events.len(), cursor = self.cursor, "history commit");
    }

    /// Step back and return the state to restore.
    ///
    /// When the previous event differs from the current text only by content
    /// while carrying the same selection, it is an intermediate state and the
    /// cursor skips over it.
    pub fn undo(&mut self, current_text: &str, current_selection: &[String]) -> Option<&HistoryEvent> {
        if self.cursor == 0 {
            debug!("undo at origin state");
            return None;
        }
        let previous = &self.events[self.cursor - 1];
        let intermediate =
            previous.text != current_text && previous.selection.as_slice() == current_selection;
        let step = if intermediate && self.cursor >= 2 { 2 } else { 1 };
        self.cursor -= step;
        debug!(step, cursor = self.cursor, "undo");
        self.events.get(self.cursor)
    }

    /// Step forward and return the state to restore
    pub fn redo(&mut self) -> Option<&HistoryEvent> {
        if self.cursor + 1 >= self.events.len() {
            debug!("redo at latest state");
            return None;
        }
        self.cursor += 1;
        debug!(cursor = self.cursor, "redo");
        self.events.get(self.cursor)
    }

    pub fn current(&self) -> Option<&HistoryEvent> {
        self.events.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str, selection: &[&str]) -> HistoryEvent {
        HistoryEvent::new(text, selection.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_undo_at_origin_is_noop() {
        let mut history = History::new(10);
        history.reset(event("<p></p>", &["0_0"]));
        assert!(history.undo("<p></p>", &["0_0".to_string()]).is_none());
        assert_eq!(history.cursor(), 0);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::new(10);
        history.reset(event("a", &["0_0"]));
        history.commit(event("ab", &["0_1"]));

        let restored = history.undo("ab", &["0_1".to_string()]).unwrap();
        assert_eq!(restored.text, "a");
        assert!(history.can_redo());

        let restored = history.redo().unwrap();
        assert_eq!(restored.text, "ab");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_commit_truncates_redo_tail() {
        let mut history = History::new(10);
        history.reset(event("a", &[]));
        history.commit(event("b", &["0_0"]));
        history.undo("b", &["0_0".to_string()]);
        history.commit(event("c", &["0_1"]));
        assert_eq!(history.len(), 2);
        assert!(history.redo().is_none());
        assert_eq!(history.current().unwrap().text, "c");
    }

    #[test]
    fn test_intermediate_state_is_skipped() {
        let mut history = History::new(10);
        history.reset(event("a", &["0_0"]));
        history.commit(event("b", &["0_1"]));
        history.commit(event("c", &["0_1"]));

        // Previous event has the current selection but other text
        let restored = history.undo("c", &["0_1".to_string()]).unwrap();
        assert_eq!(restored.text, "a");
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_limit_keeps_origin() {
        let mut history = History::new(3);
        history.reset(event("origin", &[]));
        for text in ["1", "2", "3", "4"] {
            history.commit(event(text, &[text]));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        history.undo("4", &["4".to_string()]);
        history.undo("3", &["3".to_string()]);
        assert_eq!(history.current().unwrap().text, "origin");
    }

    #[test]
    fn test_duplicate_commit_is_ignored() {
        let mut history = History::new(0);
        history.reset(event("a", &[]));
        history.commit(event("a", &[]));
        assert_eq!(history.len(), 1);
    }
}
