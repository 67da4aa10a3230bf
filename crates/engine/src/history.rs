//! Bounded, most-recent-first buffer of step outcomes.

use std::collections::VecDeque;

use radtest_types::HistoryEntry;

/// Maximum number of entries retained by the buffer.
pub const HISTORY_CAPACITY: usize = 20;

/// Ring of recent step outcomes, newest first. A capacity breach evicts
/// exactly one entry from the back per insertion.
#[derive(Debug)]
pub struct ExecutionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionHistory {
    /// Create a buffer with the standard capacity of [`HISTORY_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create a buffer with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert `entry` at the front, evicting the oldest entry when the buffer
    /// is full. O(1) amortized.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries front-to-back, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Cloned snapshot of the buffer, most recent first.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use radtest_types::StepKind;

    fn entry(tag: u64) -> HistoryEntry {
        HistoryEntry {
            command: StepKind::Alive,
            success: true,
            completed_at: Utc::now(),
            duration_ms: Some(tag),
        }
    }

    #[test]
    fn keeps_the_newest_twenty_in_reverse_insertion_order() {
        let mut history = ExecutionHistory::new();
        for tag in 0..25 {
            history.record(entry(tag));
        }

        assert_eq!(history.len(), 20);
        let durations: Vec<_> = history.iter().map(|e| e.duration_ms.unwrap()).collect();
        let expected: Vec<u64> = (5..25).rev().collect();
        assert_eq!(durations, expected);
    }

    #[test]
    fn eviction_drops_exactly_one_entry_per_insertion() {
        let mut history = ExecutionHistory::with_capacity(2);
        history.record(entry(1));
        history.record(entry(2));
        history.record(entry(3));
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().next().unwrap().duration_ms, Some(3));
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut history = ExecutionHistory::new();
        history.record(entry(1));
        history.clear();
        assert!(history.is_empty());
    }
}
