//! Bounded selection history used for reselection cooldowns.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of recently selected names.
///
/// Pushing onto a full history evicts the oldest entry. A history with
/// capacity zero never holds anything, which disables the cooldown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    capacity: usize,
    entries: VecDeque<String>,
}

impl History {
    /// Create an empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a selection.
    pub fn push(&mut self, name: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(name.into());
    }

    /// Whether `name` is among the recent selections.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry == name)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut history = History::new(2);
        history.push("a");
        history.push("b");
        history.push("c");
        assert_eq!(history.len(), 2);
        assert!(!history.contains("a"));
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut history = History::new(0);
        history.push("a");
        assert!(history.is_empty());
        assert!(!history.contains("a"));
    }
}
