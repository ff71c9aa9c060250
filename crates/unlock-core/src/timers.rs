use serde::{Deserialize, Serialize};

/// Keyed countdown timers owned by one game instance.
///
/// Games never hold timers outside their own state, so cancelling or
/// dropping the set is enough to guarantee nothing fires after teardown.
/// Scheduling a key that is already pending replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSet<K> {
    entries: Vec<TimerEntry<K>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimerEntry<K> {
    key: K,
    remaining: f32,
}

impl<K> Default for TimerSet<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> TimerSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `key` once after `delay` seconds.
    pub fn schedule(&mut self, key: K, delay: f32) {
        self.entries.retain(|e| e.key != key);
        self.entries.push(TimerEntry {
            key,
            remaining: delay.max(0.0),
        });
    }

    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        self.entries.len() != before
    }

    /// Cancel everything; returns how many timers were pending.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn remaining(&self, key: K) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.remaining)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance by `dt` seconds and return the keys that fired, most overdue
    /// first. Fired timers are removed.
    pub fn advance(&mut self, dt: f32) -> Vec<K> {
        let mut fired: Vec<(f32, K)> = Vec::new();
        for entry in &mut self.entries {
            entry.remaining -= dt;
            if entry.remaining <= 0.0 {
                fired.push((entry.remaining, entry.key));
            }
        }
        self.entries.retain(|e| e.remaining > 0.0);
        fired.sort_by(|a, b| a.0.total_cmp(&b.0));
        fired.into_iter().map(|(_, key)| key).collect()
    }
}
