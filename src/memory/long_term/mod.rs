//! Long-term memory: keyed experiences that outlive a single turn.
//!
//! Records keep insertion order, which is also the iteration order used for
//! relevance tie-breaking. Overwriting a key keeps its original position.
//! With a capacity set, inserting a new key into a full store evicts the
//! oldest record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// State vector at the time of the experience.
    pub state: Vec<f64>,
    /// Meaning text.
    pub meaning: String,
    /// Performance score attached when stored.
    pub performance: f64,
    /// When the record was created.
    #[serde(default = "Utc::now")]
    pub datetime: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(state: Vec<f64>, meaning: impl Into<String>, performance: f64) -> Self {
        Self {
            state,
            meaning: meaning.into(),
            performance,
            datetime: Utc::now(),
        }
    }
}

/// Ordered keyed store of [`MemoryRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct LongTermMemory {
    entries: Vec<(String, MemoryRecord)>,
    capacity: Option<usize>,
}

impl LongTermMemory {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding at most `capacity` records (`None` = unbounded).
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Insert or overwrite a record.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn insert(&mut self, key: impl Into<String>, record: MemoryRecord) -> Option<String> {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = record;
            return None;
        }

        let mut evicted = None;
        if let Some(cap) = self.capacity {
            if self.entries.len() >= cap && !self.entries.is_empty() {
                let (old_key, _) = self.entries.remove(0);
                log::info!("long-term memory full ({}); evicted {}", cap, old_key);
                evicted = Some(old_key);
            }
        }
        self.entries.push((key, record));
        evicted
    }

    /// Record stored under `key`.
    pub fn get(&self, key: &str) -> Option<&MemoryRecord> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    /// Whether `key` is stored.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove and return the record under `key`.
    pub fn remove(&mut self, key: &str) -> Option<MemoryRecord> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Remove every record whose stored performance is below `threshold`.
    ///
    /// Returns the number of records removed.
    pub fn prune_below(&mut self, threshold: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, r)| r.performance >= threshold);
        before - self.entries.len()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MemoryRecord)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Remove every record.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(perf: f64) -> MemoryRecord {
        MemoryRecord::new(vec![perf], format!("m{}", perf), perf)
    }

    #[test]
    fn test_insert_preserves_order_and_overwrites_in_place() {
        let mut ltm = LongTermMemory::new();
        ltm.insert("a", record(1.0));
        ltm.insert("b", record(2.0));
        ltm.insert("a", record(3.0));
        assert_eq!(ltm.keys(), vec!["a", "b"]);
        assert_eq!(ltm.get("a").unwrap().performance, 3.0);
        assert_eq!(ltm.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut ltm = LongTermMemory::with_capacity(Some(2));
        assert_eq!(ltm.insert("a", record(1.0)), None);
        assert_eq!(ltm.insert("b", record(2.0)), None);
        assert_eq!(ltm.insert("c", record(3.0)), Some("a".to_string()));
        assert_eq!(ltm.keys(), vec!["b", "c"]);
        // Overwrites never evict.
        assert_eq!(ltm.insert("b", record(4.0)), None);
        assert_eq!(ltm.len(), 2);
    }

    #[test]
    fn test_remove_and_prune() {
        let mut ltm = LongTermMemory::new();
        ltm.insert("a", record(0.1));
        ltm.insert("b", record(0.5));
        ltm.insert("c", record(0.9));
        assert_eq!(ltm.remove("b").unwrap().performance, 0.5);
        assert!(ltm.remove("b").is_none());
        assert_eq!(ltm.prune_below(0.5), 1);
        assert_eq!(ltm.keys(), vec!["c"]);
        ltm.reset();
        assert!(ltm.is_empty());
    }
}
