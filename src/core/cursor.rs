//! Bounded position within an ordered content list.

use crate::error::{Result, VentureError};

/// Result of moving a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to a neighbouring item.
    Moved,
    /// Moved past the end and started over at the first item.
    Wrapped,
    /// Already at the bound; nothing changed.
    Stayed,
}

impl Step {
    /// Check if the index changed.
    pub fn changed(&self) -> bool {
        !matches!(self, Step::Stayed)
    }
}

/// Index into a non-empty list; always within `[0, len - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    len: usize,
}

impl Cursor {
    /// Create a cursor at the first item of a list of `len` items.
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(VentureError::content("cannot navigate an empty list"));
        }
        Ok(Self { index: 0, len })
    }

    /// Current index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a cursor cannot be built over an empty list.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if the cursor is on the first item.
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Check if the cursor is on the last item.
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }

    /// Move forward, stopping at the last item.
    pub fn next_clamped(&mut self) -> Step {
        if self.is_last() {
            Step::Stayed
        } else {
            self.index += 1;
            Step::Moved
        }
    }

    /// Move back, stopping at the first item.
    pub fn previous_clamped(&mut self) -> Step {
        if self.is_first() {
            Step::Stayed
        } else {
            self.index -= 1;
            Step::Moved
        }
    }

    /// Move forward, starting over after the last item.
    pub fn next_wrapping(&mut self) -> Step {
        if self.is_last() {
            // Single-item lists restart the same item
            self.index = 0;
            Step::Wrapped
        } else {
            self.index += 1;
            Step::Moved
        }
    }

    /// Move back, continuing from the last item before the first.
    pub fn previous_wrapping(&mut self) -> Step {
        if self.is_first() {
            self.index = self.len - 1;
            Step::Wrapped
        } else {
            self.index -= 1;
            Step::Moved
        }
    }

    /// Jump to an index. Fails if it is out of range.
    pub fn jump(&mut self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(VentureError::unknown_item("position", index));
        }
        self.index = index;
        Ok(())
    }
}
