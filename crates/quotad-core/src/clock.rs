//! Millisecond clock source for the engine.
//!
//! The engine reads time through a `Clock` handle so tests can substitute a
//! manually driven value. The production clock is anchored to an `Instant`
//! and therefore monotonic; manual clocks only move forward.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic millisecond clock, cloneable so every list sharing a time
/// domain reads the same values.
#[derive(Debug, Clone)]
pub struct Clock {
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    Monotonic(Instant),
    Manual(Arc<AtomicU64>),
}

impl Clock {
    /// Real clock, anchored at creation.
    pub fn monotonic() -> Self {
        Self {
            kind: Kind::Monotonic(Instant::now()),
        }
    }

    /// Manually driven clock starting at `start_ms`, plus its driver handle.
    pub fn manual(start_ms: u64) -> (Self, ManualClock) {
        let cell = Arc::new(AtomicU64::new(start_ms));
        let clock = Self {
            kind: Kind::Manual(Arc::clone(&cell)),
        };
        (clock, ManualClock(cell))
    }

    /// Current reading in milliseconds.
    pub fn now_ms(&self) -> u64 {
        match &self.kind {
            Kind::Monotonic(anchor) => anchor.elapsed().as_millis() as u64,
            Kind::Manual(cell) => cell.load(Ordering::Relaxed),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::monotonic()
    }
}

/// Driver for a manual clock. Time never goes backwards: `set` to an
/// earlier value leaves the clock where it is.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, ms: u64) {
        self.0.fetch_max(ms, Ordering::Relaxed);
    }

    pub fn now_ms(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
