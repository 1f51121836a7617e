//! Raster history log: a linear undo/redo stack of full-canvas snapshots.
//!
//! The log always holds at least one entry (the blank canvas it was created
//! with) and a cursor `current_step` into it. Pushing while the cursor is not
//! at the end truncates everything after the cursor first, so a new stroke
//! after an undo discards the redo branch. There is no branching history.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    current_step: usize,
}

impl<T> History<T> {
    /// Start a log whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self { entries: vec![initial], current_step: 0 }
    }

    /// Drop every entry and start over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push(initial);
        self.current_step = 0;
    }

    /// Append `entry` after the cursor, discarding any redo entries.
    pub fn push(&mut self, entry: T) {
        self.entries.truncate(self.current_step + 1);
        self.entries.push(entry);
        self.current_step = self.entries.len() - 1;
        log::debug!("history push: step {} of {}", self.current_step, self.entries.len());
    }

    /// Step back one entry and return it, or `None` at the first entry.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.current_step -= 1;
        self.entries.get(self.current_step)
    }

    /// Step forward one entry and return it, or `None` at the last entry.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.current_step += 1;
        self.entries.get(self.current_step)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.current_step > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.current_step + 1 < self.entries.len()
    }

    /// The entry at the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.current_step)
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the log keeps its initial entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}
