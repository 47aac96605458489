//! Logical time for the simulation.
//!
//! A [`LogicalTime`] is an offset from a logical epoch. It only moves when a
//! test advances the fixture clock, never with the wall clock.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogicalTime(Duration);

impl LogicalTime {
    pub const EPOCH: LogicalTime = LogicalTime(Duration::zero());

    pub fn since_epoch(offset: Duration) -> Self {
        Self(offset)
    }

    pub fn from_secs(secs: i64) -> Self {
        Self(Duration::seconds(secs))
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(Duration::milliseconds(millis))
    }

    pub fn offset(&self) -> Duration {
        self.0
    }

    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add(&duration).map(Self)
    }

    pub fn duration_since(&self, earlier: LogicalTime) -> Option<Duration> {
        self.0.checked_sub(&earlier.0)
    }

    /// Wall-clock rendering with the epoch at 1970-01-01T00:00:00Z.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(0, 0)?.checked_add_signed(self.0)
    }
}

impl Default for LogicalTime {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{}", datetime.to_rfc3339()),
            None => write!(f, "epoch+{}", self.0),
        }
    }
}
