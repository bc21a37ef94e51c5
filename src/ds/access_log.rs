//! Bounded per-key access history.
//!
//! Records an access timestamp per `track` call and keeps, for each key, only
//! the samples from the last hour, capped at the 100 most recent. The window
//! is what the hot-key classifier reads: with at least five samples over a
//! positive span, `rate` reports accesses per second.
//!
//! | Operation      | Description                              |
//! |----------------|------------------------------------------|
//! | `record`       | Append now; prune expired/excess samples |
//! | `rate`         | Samples per second over the sample span  |
//! | `sample_count` | Live samples after pruning               |
//!
//! Timestamps are monotonic (`Instant`): rates must not go negative when the
//! wall clock steps.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Samples retained per key.
const MAX_SAMPLES: usize = 100;
/// Samples older than this are dropped.
const SAMPLE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Sliding-window access history for a set of keys.
#[derive(Debug)]
pub struct AccessLog<K> {
    samples: FxHashMap<K, VecDeque<Instant>>,
}

impl<K> AccessLog<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            samples: FxHashMap::default(),
        }
    }

    /// Records an access to `key` at the current instant.
    pub fn record(&mut self, key: &K) {
        let now = Instant::now();
        let history = self.samples.entry(key.clone()).or_default();
        history.push_back(now);
        Self::prune(history, now);
    }

    /// Accesses per second over the retained sample span. `None` until the
    /// key has at least 5 live samples spread over a positive span.
    pub fn rate(&mut self, key: &K) -> Option<f64> {
        let now = Instant::now();
        let history = self.samples.get_mut(key)?;
        Self::prune(history, now);
        if history.len() < 5 {
            return None;
        }
        let span = history
            .back()?
            .saturating_duration_since(*history.front()?)
            .as_secs_f64();
        if span > 0.0 {
            Some(history.len() as f64 / span)
        } else {
            None
        }
    }

    /// Number of live samples for `key` after pruning.
    pub fn sample_count(&mut self, key: &K) -> usize {
        let now = Instant::now();
        match self.samples.get_mut(key) {
            Some(history) => {
                Self::prune(history, now);
                history.len()
            },
            None => 0,
        }
    }

    /// Number of keys with any recorded history.
    pub fn tracked_keys(&self) -> usize {
        self.samples.len()
    }

    pub fn forget(&mut self, key: &K) {
        self.samples.remove(key);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn prune(history: &mut VecDeque<Instant>, now: Instant) {
        while let Some(front) = history.front() {
            if now.saturating_duration_since(*front) > SAMPLE_WINDOW {
                history.pop_front();
            } else {
                break;
            }
        }
        while history.len() > MAX_SAMPLES {
            history.pop_front();
        }
    }
}

impl<K> Default for AccessLog<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
