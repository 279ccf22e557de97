use super::ViewState;
use std::collections::VecDeque;

/// Bounded undo stack of whole views. The oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    entries: VecDeque<ViewState>,
    capacity: usize,
}

impl NavigationHistory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Push a view, evicting the oldest when full.
    pub fn push(&mut self, view: ViewState) {
        self.entries.push_back(view);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Pop the most recent view.
    pub fn pop(&mut self) -> Option<ViewState> {
        self.entries.pop_back()
    }

    /// The most recent view, without removing it.
    #[must_use]
    pub fn last(&self) -> Option<&ViewState> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ViewState> {
        self.entries.iter()
    }
}
