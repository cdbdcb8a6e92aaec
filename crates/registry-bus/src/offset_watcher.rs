//! Offset watcher (C3): a condition-variable-like primitive letting many
//! waiters block until a target log offset has been seen.

use std::sync::Mutex;

use registry_types::Offset;
use tokio::sync::Notify;
use tokio::time::{timeout, Duration, Instant};

/// Synchronization container for tasks to wait until an offset has been
/// folded into the projection.
///
/// Offsets are assumed unique and monotonic on the single log partition;
/// behavior under unclean leader election (duplicate or regressing
/// offsets) is undefined, matching the upstream contract.
pub struct OffsetWatcher {
    greatest_offset: Mutex<Offset>,
    notify: Notify,
}

impl Default for OffsetWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetWatcher {
    /// Create a watcher with no offset seen yet.
    pub fn new() -> Self {
        OffsetWatcher {
            // -1 is never a valid first offset, so it can't be confused
            // with "offset zero already seen".
            greatest_offset: Mutex::new(-1),
            notify: Notify::new(),
        }
    }

    /// Record that `new_offset` has been folded, advancing the watermark
    /// if it's higher than what's already recorded, and wake all waiters.
    pub fn offset_seen(&self, new_offset: Offset) {
        let mut guard = self.greatest_offset.lock().unwrap();
        if new_offset > *guard {
            *guard = new_offset;
        }
        drop(guard);
        self.notify.notify_waiters();
    }

    /// The greatest offset seen so far.
    pub fn greatest_offset(&self) -> Offset {
        *self.greatest_offset.lock().unwrap()
    }

    /// Block until `greatest_offset >= expected_offset` or `timeout_dur`
    /// elapses. Returns whether the condition was met.
    pub async fn wait_for_offset(&self, expected_offset: Offset, timeout_dur: Duration) -> bool {
        if self.greatest_offset() >= expected_offset {
            return true;
        }

        let deadline = Instant::now() + timeout_dur;
        loop {
            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(d) if !d.is_zero() => d,
                _ => return self.greatest_offset() >= expected_offset,
            };

            // Register interest before re-checking to avoid missing a
            // notification fired between the check and the await below.
            let notified = self.notify.notified();
            if self.greatest_offset() >= expected_offset {
                return true;
            }
            if timeout(remaining, notified).await.is_err() {
                return self.greatest_offset() >= expected_offset;
            }
        }
    }
}
