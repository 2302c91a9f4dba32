//! Rate-limit policy: count/period/block-size validation and the textual
//! `count/period[m|h|d]` definition grammar shared by the CLI and dynlist
//! keys.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{QuotadError, Result};

/// Upper bound on a policy period. Keeps window offsets comfortably inside
/// u32 milliseconds even right after an epoch rebase.
pub const MAX_PERIOD: Duration = Duration::from_secs(45 * 86400);

/// Granularity of capacity growth for an entry's hit buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockSize {
    /// Fixed number of slots per allocation.
    Slots(u32),
    /// Fraction of `count`, rounded up. The default fifth means at worst
    /// five allocations, or at worst a fifth of the memory idle.
    Fraction(f64),
}

impl Default for BlockSize {
    fn default() -> Self {
        BlockSize::Fraction(0.2)
    }
}

/// Validated "N hits per P" policy.
#[derive(Debug, Clone)]
pub struct Policy {
    pub count: u32,
    pub period: Duration,
    pub block_size: BlockSize,
}

impl Policy {
    pub fn new(count: u32, period: Duration) -> Self {
        Self {
            count,
            period,
            block_size: BlockSize::default(),
        }
    }

    pub fn with_block_size(mut self, block_size: BlockSize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(QuotadError::InvalidCount);
        }
        if self.period.is_zero() {
            return Err(QuotadError::InvalidPeriod);
        }
        if self.period > MAX_PERIOD {
            return Err(QuotadError::PeriodTooLong(self.period));
        }
        match self.block_size {
            BlockSize::Slots(0) => Err(QuotadError::InvalidBlockSize),
            BlockSize::Slots(_) => Ok(()),
            BlockSize::Fraction(f) if f > 0.0 && f <= 1.0 => Ok(()),
            BlockSize::Fraction(f) => Err(QuotadError::InvalidBlockFraction(f)),
        }
    }

    pub(crate) fn period_ms(&self) -> u64 {
        self.period.as_millis() as u64
    }

    /// Resolved allocation granularity in slots, at least one.
    pub(crate) fn block_slots(&self) -> u32 {
        match self.block_size {
            BlockSize::Slots(n) => n,
            BlockSize::Fraction(f) => ((self.count as f64 * f).ceil() as u32).max(1),
        }
    }
}

/// Parsed `count/period` definition: `5/1m` is five hits per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSpec {
    pub count: u32,
    pub period: Duration,
}

impl FromStr for RateSpec {
    type Err = QuotadError;

    fn from_str(s: &str) -> Result<Self> {
        parse_rate(s)
            .map(|(count, secs)| RateSpec {
                count,
                period: Duration::from_secs(secs),
            })
            .ok_or_else(|| QuotadError::InvalidDefinition(s.to_owned()))
    }
}

impl fmt::Display for RateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.count, self.period.as_secs())
    }
}

/// Parse `C/P[m|h|d]` into `(count, period_seconds)`. Both numbers must be
/// plain decimals in `1..=i32::MAX` with nothing trailing; anything else is
/// a parse failure.
pub(crate) fn parse_rate(s: &str) -> Option<(u32, u64)> {
    let (count, period) = s.split_once('/')?;
    let count = parse_bounded(count)?;
    let (digits, unit) = match period.as_bytes().last()? {
        b'm' => (&period[..period.len() - 1], 60u64),
        b'h' => (&period[..period.len() - 1], 3600),
        b'd' => (&period[..period.len() - 1], 86400),
        _ => (period, 1),
    };
    let period = parse_bounded(digits)?;
    Some((count, u64::from(period) * unit))
}

fn parse_bounded(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = s.parse().ok()?;
    (1..=i32::MAX as u32).contains(&value).then_some(value)
}
