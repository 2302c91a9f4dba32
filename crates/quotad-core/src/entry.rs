//! Per-key sliding-window history.
//!
//! Hit timestamps are stored as u32 millisecond offsets from a per-entry
//! epoch, so one slot costs four bytes. When a fresh offset would no longer
//! fit, the epoch is rebased forward and offsets older than the window fall
//! out. The buffer grows in multiples of the policy block size.

use serde::{Deserialize, Serialize};

/// Hit history for a single key. Operations take the caller's clock reading
/// and policy parameters; the entry itself stores no policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    epoch: u64,
    hits: Vec<u32>,
}

impl Entry {
    pub fn new(now_ms: u64) -> Self {
        Self {
            epoch: now_ms,
            hits: Vec::new(),
        }
    }

    /// Record an admission attempt at `now_ms`. Returns whether the hit is
    /// admitted; rejected hits leave the history untouched.
    pub fn hit(&mut self, now_ms: u64, count: u32, period_ms: u64, block: u32) -> bool {
        if now_ms.saturating_sub(self.epoch) > u64::from(u32::MAX) - period_ms {
            self.rebase(now_ms, period_ms);
        }
        let t = now_ms.saturating_sub(self.epoch) as u32;

        let stale = self
            .hits
            .iter()
            .take_while(|&&h| u64::from(h) + period_ms <= u64::from(t))
            .count();
        if stale > 0 {
            self.hits.drain(..stale);
        }

        if self.hits.len() >= count as usize {
            return false;
        }
        if self.hits.len() == self.hits.capacity() {
            self.hits.reserve_exact(block as usize);
        }
        self.hits.push(t);
        true
    }

    /// Milliseconds until `hit` would succeed, zero when it would succeed
    /// right now (including an empty history). Does not mutate.
    pub fn next_hit(&self, now_ms: u64, count: u32, period_ms: u64) -> u32 {
        if self.hits.len() < count as usize {
            return 0;
        }
        let t = now_ms.saturating_sub(self.epoch);
        let stale = self
            .hits
            .iter()
            .take_while(|&&h| u64::from(h) + period_ms <= t)
            .count();
        if self.hits.len() - stale < count as usize {
            return 0;
        }
        (u64::from(self.hits[stale]) + period_ms - t) as u32
    }

    /// Whether the newest hit has aged out of the window entirely.
    pub fn is_expired(&self, now_ms: u64, period_ms: u64) -> bool {
        match self.hits.last() {
            None => true,
            Some(&newest) => self.epoch + u64::from(newest) + period_ms <= now_ms,
        }
    }

    /// Move the epoch to `now_ms - period_ms` so fresh offsets fit in u32
    /// again. Offsets behind the new epoch are strictly older than the
    /// window and are dropped.
    fn rebase(&mut self, now_ms: u64, period_ms: u64) {
        let new_epoch = now_ms - period_ms;
        let shift = new_epoch - self.epoch;
        let dropped = self
            .hits
            .iter()
            .take_while(|&&h| u64::from(h) < shift)
            .count();
        self.hits.drain(..dropped);
        for h in &mut self.hits {
            *h -= shift as u32;
        }
        self.epoch = new_epoch;
    }
}
