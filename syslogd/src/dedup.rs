//! Component D: time-windowed fingerprint deduplication (spec §4.D).
//!
//! Guarded by a single mutex with a small critical section (hash + map
//! lookup + optional eviction), per spec §5's concurrency model — this is
//! deliberately not a sharded map or a lock-free structure.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::message::ParsedMessage;

/// Default sliding window during which duplicates are suppressed.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(600);
/// Default cap on the number of tracked fingerprints.
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// Compute the stable fingerprint over `(source_ip, priority, message)`.
/// Timestamp and hostname are deliberately excluded so repeated alerts with
/// drifting timestamps still collapse.
pub fn fingerprint(source_ip: &str, priority: u8, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_ip.as_bytes());
    hasher.update([0u8]);
    hasher.update(priority.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(message.as_bytes());
    hex::encode(hasher.finalize())
}

/// Time-windowed fingerprint cache. `accept` is the only entry point and is
/// safe to call concurrently from any number of transports.
pub struct Deduplicator {
    window: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, Instant>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_WINDOW, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_params(window: Duration, max_entries: usize) -> Self {
        Self {
            window,
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if `record` should be written, `false` if it is a
    /// within-window duplicate. First-seen wins: a duplicate does not
    /// refresh the window.
    pub fn accept(&self, record: &ParsedMessage) -> bool {
        let fp = fingerprint(&record.source_ip, record.priority, &record.message);
        let now = Instant::now();

        let mut entries = self.entries.lock().expect("dedup mutex poisoned");

        entries.retain(|_, seen| now.duration_since(*seen) <= self.window);

        if entries.contains_key(&fp) {
            return false;
        }

        if entries.len() >= self.max_entries {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, seen)| **seen)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(fp, now);
        true
    }

    /// Current number of tracked fingerprints (for tests/diagnostics).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("dedup mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}
