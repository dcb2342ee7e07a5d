//! Bounded, newest-first archive of completed lifecycle records.
//!
//! Each site keeps one ledger for visits and one for key loans. Entries are
//! only ever added at the head; once the ledger grows past its retention
//! bound the oldest archived entries fall off the tail.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Newest-first ledger of archived records.
///
/// Serialized as a plain JSON array (index 0 is the most recent entry), which
/// is also how it is stored in the `visitor_history` / `key_history` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History<T> {
    entries: VecDeque<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive a completed record at the head of the ledger.
    ///
    /// Eviction is by archival order, not by the record's own timestamps.
    /// A `limit` of zero is treated as one so the entry just archived is
    /// always retained.
    pub fn archive(&mut self, entry: T, limit: usize) {
        self.entries.push_front(entry);
        self.entries.truncate(limit.max(1));
    }

    /// Most recently archived entry.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T> FromIterator<T> for History<T> {
    /// Build a ledger from entries already ordered newest first.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_prepends_newest_entry() {
        let mut history = History::new();
        history.archive("first", 50);
        history.archive("second", 50);

        assert_eq!(history.latest(), Some(&"second"));
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec!["second", "first"]);
    }

    #[test]
    fn archive_evicts_oldest_past_limit() {
        let mut history = History::new();
        for i in 0..25 {
            history.archive(i, 20);
        }

        assert_eq!(history.len(), 20);
        assert_eq!(history.latest(), Some(&24));
        // 0..=4 were archived first and are gone
        assert_eq!(history.iter().last(), Some(&5));
    }

    #[test]
    fn eviction_ignores_entry_values() {
        // A ledger loaded from storage may already exceed a lowered bound.
        let mut history: History<u32> = vec![9, 8, 7, 6].into_iter().collect();
        history.archive(1, 2);

        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![1, 9]);
    }

    #[test]
    fn zero_limit_keeps_latest() {
        let mut history = History::new();
        history.archive('a', 0);
        history.archive('b', 0);

        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(&'b'));
    }

    #[test]
    fn serializes_as_plain_array() {
        let history: History<u32> = vec![3, 2, 1].into_iter().collect();
        assert_eq!(serde_json::to_string(&history).unwrap(), "[3,2,1]");

        let parsed: History<u32> = serde_json::from_str("[]").unwrap();
        assert!(parsed.is_empty());
    }
}
