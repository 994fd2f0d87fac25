//! Deadline entries checked once per tick.

use std::time::Duration;

/// A set of keyed deadlines on a clock that only the tick loop advances.
///
/// Expired keys come back from [`advance`](Self::advance) in deadline
/// order; keys sharing a deadline come back in scheduling order.
#[derive(Debug, Clone)]
pub struct Deadlines<K> {
    now: Duration,
    entries: Vec<(Duration, K)>,
}

impl<K> Default for Deadlines<K> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            entries: Vec::new(),
        }
    }
}

impl<K> Deadlines<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `key` to expire `after` from now.
    pub fn schedule(&mut self, after: Duration, key: K) {
        let due = self.now + after;
        let at = self.entries.partition_point(|(d, _)| *d <= due);
        self.entries.insert(at, (due, key));
    }

    /// Moves the clock forward by `dt` and removes every expired entry.
    pub fn advance(&mut self, dt: Duration) -> Vec<K> {
        self.now += dt;
        let now = self.now;
        let expired = self.entries.partition_point(|(d, _)| *d <= now);
        self.entries.drain(..expired).map(|(_, k)| k).collect()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: PartialEq> Deadlines<K> {
    /// `true` if `key` has an entry that hasn't expired yet.
    pub fn is_pending(&self, key: &K) -> bool {
        self.entries.iter().any(|(_, k)| k == key)
    }
}
