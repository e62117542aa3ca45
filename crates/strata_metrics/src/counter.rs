//! Monotonic counters for structural events
//!
//! The world feeds these from its playback path (entities spawned and
//! despawned, commands replayed and dropped). Names are static so the hot
//! path never allocates; `snapshot` gives a name-sorted view for summaries.

use std::collections::HashMap;

pub struct Counter {
    counts: HashMap<&'static str, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    pub fn increment(&mut self, name: &'static str, value: u64) {
        *self.counts.entry(name).or_insert(0) += value;
    }

    /// Current count, zero for names never incremented.
    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counts.clear();
    }

    /// Name-sorted (name, count) pairs for logging.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        let mut entries: Vec<(&'static str, u64)> = self
            .counts
            .iter()
            .map(|(&name, &count)| (name, count))
            .collect();
        entries.sort_unstable_by_key(|&(name, _)| name);
        entries
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_name() {
        let mut counter = Counter::new();
        counter.increment("spawns", 1);
        counter.increment("spawns", 2);
        counter.increment("despawns", 1);
        assert_eq!(counter.get("spawns"), 3);
        assert_eq!(counter.get("despawns"), 1);
        assert_eq!(counter.get("unseen"), 0);
    }

    #[test]
    fn snapshot_is_name_sorted() {
        let mut counter = Counter::new();
        counter.increment("zeta", 9);
        counter.increment("alpha", 4);
        assert_eq!(counter.snapshot(), vec![("alpha", 4), ("zeta", 9)]);

        counter.reset_all();
        assert!(counter.snapshot().is_empty());
    }
}
