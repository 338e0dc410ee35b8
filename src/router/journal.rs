//! Navigation journal.
//!
//! An immutable, capped record of finished transitions. Recording returns a
//! new journal rather than mutating the old one.

use crate::node::NodeKey;
use crate::transition::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single finished transition.
///
/// `to` is `None` when the transition was cancelled or faulted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct JournalEntry<K: NodeKey> {
    /// The node that was current when the transition started
    pub from: Option<K>,
    /// The node reached
    pub to: Option<K>,
    pub direction: Direction,
    /// When the transition finished
    pub timestamp: DateTime<Utc>,
}

/// Ordered, capped history of finished transitions.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use waymark::router::{JournalEntry, NavigationJournal};
/// use waymark::transition::Direction;
///
/// let journal = NavigationJournal::with_capacity(8)
///     .record(JournalEntry {
///         from: None,
///         to: Some("Title".to_string()),
///         direction: Direction::Forward,
///         timestamp: Utc::now(),
///     })
///     .record(JournalEntry {
///         from: Some("Title".to_string()),
///         to: Some("Home".to_string()),
///         direction: Direction::Forward,
///         timestamp: Utc::now(),
///     });
///
/// let path: Vec<&str> = journal.get_path().into_iter().map(String::as_str).collect();
/// assert_eq!(path, vec!["Title", "Home"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct NavigationJournal<K: NodeKey> {
    entries: Vec<JournalEntry<K>>,
    capacity: usize,
}

pub const DEFAULT_JOURNAL_CAPACITY: usize = 64;

impl<K: NodeKey> Default for NavigationJournal<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> NavigationJournal<K> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }

    /// A journal that keeps at most `capacity` entries, dropping the oldest.
    /// A capacity of zero records nothing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Record an entry, returning a new journal.
    pub fn record(&self, entry: JournalEntry<K>) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        let overflow = entries.len().saturating_sub(self.capacity);
        entries.drain(..overflow);
        Self {
            entries,
            capacity: self.capacity,
        }
    }

    /// Nodes visited: where the first entry started, then every node reached.
    /// Aborted transitions contribute nothing.
    pub fn get_path(&self) -> Vec<&K> {
        let mut path = Vec::new();
        if let Some(first) = self.entries.first().and_then(|e| e.from.as_ref()) {
            path.push(first);
        }
        path.extend(self.entries.iter().filter_map(|e| e.to.as_ref()));
        path
    }

    /// Time between the first and last entry.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn entries(&self) -> &[JournalEntry<K>] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(from: Option<&str>, to: Option<&str>) -> JournalEntry<String> {
        JournalEntry {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            direction: Direction::Forward,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_journal_is_empty() {
        let journal: NavigationJournal<String> = NavigationJournal::new();
        assert!(journal.is_empty());
        assert!(journal.get_path().is_empty());
        assert!(journal.duration().is_none());
        assert_eq!(journal.capacity(), DEFAULT_JOURNAL_CAPACITY);
    }

    #[test]
    fn record_is_immutable() {
        let journal = NavigationJournal::new();
        let next = journal.record(entry(None, Some("Title")));
        assert_eq!(journal.len(), 0);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn capacity_drops_oldest() {
        let journal = NavigationJournal::with_capacity(2)
            .record(entry(None, Some("A")))
            .record(entry(Some("A"), Some("B")))
            .record(entry(Some("B"), Some("C")));

        assert_eq!(journal.len(), 2);
        let path: Vec<&String> = journal.get_path();
        assert_eq!(path, vec!["A", "B", "C"]);
    }

    #[test]
    fn aborted_entries_are_skipped_in_path() {
        let journal = NavigationJournal::new()
            .record(entry(None, Some("A")))
            .record(entry(Some("A"), None));
        assert_eq!(journal.get_path(), vec!["A"]);
    }

    #[test]
    fn journal_serializes_correctly() {
        let journal = NavigationJournal::new().record(entry(None, Some("A")));
        let json = serde_json::to_string(&journal).unwrap();
        let restored: NavigationJournal<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.entries()[0].to.as_deref(), Some("A"));
    }
}
