use crate::content::EditorContent;
use crate::selection::SelectionState;

pub const DEFAULT_MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub content: EditorContent,
    pub selection: Option<SelectionState>,
}

/// Linear, bounded snapshot history.
///
/// Entries are owned values: every push stores a clone and every undo/redo hands out a
/// clone, so callers can never reach the stored snapshots by reference.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    position: Option<usize>,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            position: None,
            max_entries: max_entries.max(1),
        }
    }

    pub fn push(&mut self, content: &EditorContent, selection: Option<&SelectionState>) {
        let keep = self.position.map_or(0, |position| position + 1);
        if keep < self.entries.len() {
            tracing::debug!(
                discarded = self.entries.len() - keep,
                "discarding redo branch"
            );
            self.entries.truncate(keep);
        }

        self.entries.push(HistoryEntry {
            content: content.clone(),
            selection: selection.cloned(),
        });
        let mut position = self.entries.len() - 1;

        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
            position = position.saturating_sub(1);
            tracing::debug!(max = self.max_entries, "evicted oldest history entry");
        }
        self.position = Some(position);
    }

    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let position = self.position.filter(|position| *position > 0)? - 1;
        self.position = Some(position);
        self.entries.get(position).cloned()
    }

    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let position = self.position.map_or(0, |position| position + 1);
        if position >= self.entries.len() {
            return None;
        }
        self.position = Some(position);
        self.entries.get(position).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.position.is_some_and(|position| position > 0)
    }

    pub fn can_redo(&self) -> bool {
        let next = self.position.map_or(0, |position| position + 1);
        next < self.entries.len()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.position = None;
    }

    pub fn current(&self) -> Option<HistoryEntry> {
        self.position
            .and_then(|position| self.entries.get(position))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor into the stack; `None` before the first push.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
