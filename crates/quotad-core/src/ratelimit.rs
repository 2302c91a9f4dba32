//! Keyed sliding-window rate limiter.
//!
//! One `RateLimit` owns every entry for one policy. Lists are shared as
//! `Arc<Mutex<RateLimit>>`: connections and the cleanup driver serialise on
//! the one lock, and dynlist children are themselves shared lists keyed by
//! their normalised policy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::entry::Entry;
use crate::error::Result;
use crate::policy::{parse_rate, BlockSize, Policy};

/// A rate-limit list shared between connections and the cleanup driver.
pub type SharedRateLimit = Arc<Mutex<RateLimit>>;

pub struct RateLimit {
    policy: Policy,
    period_ms: u64,
    block: u32,
    clock: Clock,
    entries: HashMap<String, Entry>,
    dlists: HashMap<(u32, u64), SharedRateLimit>,
}

impl RateLimit {
    /// Build a list with a validated policy and the real clock.
    pub fn new(policy: Policy) -> Result<Self> {
        Self::with_clock(policy, Clock::monotonic())
    }

    /// Build a list reading time from `clock` (tests drive a manual one).
    pub fn with_clock(policy: Policy, clock: Clock) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            period_ms: policy.period_ms(),
            block: policy.block_slots(),
            policy,
            clock,
            entries: HashMap::new(),
            dlists: HashMap::new(),
        })
    }

    pub fn count(&self) -> u32 {
        self.policy.count
    }

    pub fn period(&self) -> Duration {
        self.policy.period
    }

    pub fn block_size(&self) -> u32 {
        self.block
    }

    /// Record a hit against `key`, creating its entry on first sight.
    pub fn hit(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        if let Some(entry) = self.entries.get_mut(key) {
            entry.hit(now, self.policy.count, self.period_ms, self.block)
        } else {
            let mut entry = Entry::new(now);
            let admitted = entry.hit(now, self.policy.count, self.period_ms, self.block);
            self.entries.insert(key.to_owned(), entry);
            admitted
        }
    }

    /// Milliseconds until the next admitted hit for `key`, or `None` when
    /// the key has no entry.
    pub fn next_hit(&self, key: &str) -> Option<u32> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map(|entry| entry.next_hit(now, self.policy.count, self.period_ms))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop `key`'s entry. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry whose newest hit has aged out, then give dynlist
    /// children the same pass and forget the ones that come back empty.
    /// Returns how many of this list's own entries were pruned.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let period_ms = self.period_ms;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_expired(now, period_ms));
        let pruned = before - self.entries.len();

        self.dlists.retain(|_, child| {
            let mut child = match child.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            child.cleanup();
            !child.is_empty()
        });

        if pruned > 0 {
            tracing::trace!(pruned, remaining = self.entries.len(), "pruned expired entries");
        }
        pruned
    }

    /// Resolve a `C/P[m|h|d]:rest` key into the shared child list for that
    /// policy plus the residual key. `None` means the input carries no
    /// usable spec and the caller should fall back to this list with the
    /// whole input as the key.
    pub fn dynlist(&mut self, input: &str) -> Option<(SharedRateLimit, String)> {
        let (spec, rest) = input.split_once(':')?;
        let (count, period_s) = parse_rate(spec)?;
        let period = Duration::from_secs(period_s);
        let id = (count, period.as_millis() as u64);

        if let Some(child) = self.dlists.get(&id) {
            return Some((Arc::clone(child), rest.to_owned()));
        }

        let child = Self::with_clock(Policy::new(count, period), self.clock.clone()).ok()?;
        let child = Arc::new(Mutex::new(child));
        self.dlists.insert(id, Arc::clone(&child));
        tracing::debug!(count, period_s, "created dynlist child");
        Some((child, rest.to_owned()))
    }

    /// Serialisable view of the policy and entries. Dynlist children and
    /// any installed cleanup task are not part of the snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            count: self.policy.count,
            period_ms: self.period_ms,
            block_size: self.block,
            entries: self.entries.clone(),
        }
    }

    /// Rebuild a list from a snapshot. Only meaningful against the clock
    /// domain the snapshot was taken in.
    pub fn restore(snapshot: Snapshot, clock: Clock) -> Result<Self> {
        let policy = Policy {
            count: snapshot.count,
            period: Duration::from_millis(snapshot.period_ms),
            block_size: BlockSize::Slots(snapshot.block_size),
        };
        let mut list = Self::with_clock(policy, clock)?;
        list.entries = snapshot.entries;
        Ok(list)
    }
}

/// Snapshot of a list: policy plus per-key histories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub count: u32,
    pub period_ms: u64,
    pub block_size: u32,
    pub entries: HashMap<String, Entry>,
}
