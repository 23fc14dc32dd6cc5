//! The Failure Tracker (spec §4.5): in-memory, per-target consecutive
//! failure counts that drive auto-stop.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::TargetId;

/// Counts consecutive cycle failures per target. Counters do not survive a
/// process restart by design (spec §4.5: "on restart, the target gets a
/// clean slate").
#[derive(Default)]
pub struct FailureTracker {
    counters: Mutex<HashMap<TargetId, u32>>,
    threshold: u32,
}

impl FailureTracker {
    /// Creates a tracker with the given auto-stop threshold.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            threshold,
        }
    }

    /// Records one failure for `target_id`, returning the new count.
    ///
    /// A call for a target already at or past the threshold is a no-op
    /// that returns the unchanged (already-at-threshold) count, matching
    /// "subsequent `record_failure` calls on the same target are no-ops".
    pub fn record_failure(&self, target_id: TargetId) -> u32 {
        let mut counters = self.counters.lock().unwrap();
        let count = counters.entry(target_id).or_insert(0);
        if *count < self.threshold {
            *count += 1;
        }
        *count
    }

    /// Resets the counter for `target_id` to zero.
    pub fn record_success(&self, target_id: TargetId) {
        self.counters.lock().unwrap().insert(target_id, 0);
    }

    /// Returns `true` if `count` meets or exceeds the auto-stop threshold.
    #[must_use]
    pub const fn is_at_threshold(&self, count: u32) -> bool {
        count >= self.threshold
    }

    /// Drops the counter for `target_id`, e.g. once a target is stopped.
    pub fn remove(&self, target_id: TargetId) {
        self.counters.lock().unwrap().remove(&target_id);
    }

    /// Drops every counter, e.g. when the activity log is cleared (spec
    /// §4.6: "resets all failure counters").
    pub fn clear_all(&self) {
        self.counters.lock().unwrap().clear();
    }

    /// The current count for `target_id`, or 0 if never recorded.
    #[must_use]
    pub fn current(&self, target_id: TargetId) -> u32 {
        self.counters.lock().unwrap().get(&target_id).copied().unwrap_or(0)
    }
}
