//! Session buffer owned by the report loop.
//!
//! Snapshots arrive from the capture loop over a channel; only the report loop
//! holds the buffer, so appends, window reads and pruning never race.

use crate::{Snapshot, Timestamp};

#[derive(Clone, Debug, Default)]
pub struct SessionBuffer {
    snapshots: Vec<Snapshot>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Snapshots captured at or after `since`, in arrival order.
    pub fn window(&self, since: Timestamp) -> Vec<Snapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.timestamp >= since)
            .cloned()
            .collect()
    }

    /// Drop snapshots captured before `cutoff`. Returns how many were removed.
    pub fn retain_since(&mut self, cutoff: Timestamp) -> usize {
        let before = self.snapshots.len();
        self.snapshots.retain(|snapshot| snapshot.timestamp >= cutoff);
        let removed = before - self.snapshots.len();
        if removed > 0 {
            log::debug!("pruned {} snapshots older than {}", removed, cutoff);
        }
        removed
    }
}
