//! Virtual clock and event scheduler.
//!
//! Scheduled events are kept ordered by `(due_at, token)`. Tokens are handed
//! out in insertion order, so events due at the same instant fire first in,
//! first out. Time only moves through [`EventScheduler::advance_to`] and
//! [`EventScheduler::advance_by`].

use chrono::Duration;
use choreo_store::Message;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};
use tracing::debug;

use crate::{
    error::{Error, Result},
    time::LogicalTime,
};

/// Handle returned when scheduling, used to cancel the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduleToken(u64);

impl fmt::Display for ScheduleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schedule:{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub event: Message,
    pub due_at: LogicalTime,
    pub token: ScheduleToken,
}

#[derive(Debug, Default)]
struct Schedule {
    now: LogicalTime,
    next_token: u64,
    pending: BTreeMap<(LogicalTime, ScheduleToken), ScheduledEvent>,
    due_by_token: HashMap<ScheduleToken, LogicalTime>,
}

impl Schedule {
    fn pop_due(&mut self, until: LogicalTime) -> Option<ScheduledEvent> {
        let (&(due_at, token), _) = self.pending.first_key_value()?;

        if due_at > until {
            return None;
        }

        let scheduled = self.pending.remove(&(due_at, token))?;
        self.due_by_token.remove(&token);
        self.now = due_at;

        Some(scheduled)
    }
}

/// Deterministic scheduler driven by logical time.
///
/// Cloning yields another handle on the same schedule, which is how saga
/// handlers schedule and cancel while the scheduler is firing: the internal
/// lock is never held while a fired event is handed out.
#[derive(Debug, Clone, Default)]
pub struct EventScheduler(Arc<RwLock<Schedule>>);

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(time: LogicalTime) -> Self {
        let scheduler = Self::default();
        scheduler.0.write().now = time;
        scheduler
    }

    pub fn now(&self) -> LogicalTime {
        self.0.read().now
    }

    pub fn schedule_at(&self, time: LogicalTime, event: Message) -> Result<ScheduleToken> {
        let mut schedule = self.0.write();

        if time < schedule.now {
            return Err(Error::InvalidTime {
                now: schedule.now,
                target: time,
            });
        }

        let token = ScheduleToken(schedule.next_token);
        schedule.next_token += 1;

        debug!("{token} scheduled {} at {time}", event.name);

        schedule.pending.insert(
            (time, token),
            ScheduledEvent {
                event,
                due_at: time,
                token,
            },
        );
        schedule.due_by_token.insert(token, time);

        Ok(token)
    }

    pub fn schedule_after(&self, duration: Duration, event: Message) -> Result<ScheduleToken> {
        let time = self.offset(duration)?;

        self.schedule_at(time, event)
    }

    /// Returns whether a pending event was removed. Fired and already
    /// cancelled tokens are ignored.
    pub fn cancel(&self, token: ScheduleToken) -> bool {
        let mut schedule = self.0.write();
        let Some(due_at) = schedule.due_by_token.remove(&token) else {
            return false;
        };

        debug!("{token} cancelled");

        schedule.pending.remove(&(due_at, token)).is_some()
    }

    pub fn all_pending(&self) -> Vec<ScheduledEvent> {
        self.0.read().pending.values().cloned().collect()
    }

    pub fn pending_at(&self, time: LogicalTime) -> Vec<ScheduledEvent> {
        self.0
            .read()
            .pending
            .values()
            .filter(|scheduled| scheduled.due_at == time)
            .cloned()
            .collect()
    }

    pub fn next_due_at(&self) -> Option<LogicalTime> {
        self.0
            .read()
            .pending
            .first_key_value()
            .map(|((due_at, _), _)| *due_at)
    }

    pub fn len(&self) -> usize {
        self.0.read().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().pending.is_empty()
    }

    /// Moves the clock to `target`, handing every event due on or before it
    /// to `fire`, earliest first.
    ///
    /// While an event fires the clock reads its due time, so events scheduled
    /// by `fire` are relative to that instant and fire in the same call when
    /// they fall due before `target`. Moving to the current time leaves the
    /// clock where it is but still fires events due now. Returns how many
    /// events fired.
    pub fn advance_to<F>(&self, target: LogicalTime, mut fire: F) -> Result<usize>
    where
        F: FnMut(ScheduledEvent) -> Result<()>,
    {
        let now = self.now();

        if target < now {
            return Err(Error::InvalidTime { now, target });
        }

        let mut fired = 0;

        loop {
            let next = self.0.write().pop_due(target);
            let Some(scheduled) = next else {
                break;
            };

            debug!(
                "{} fired {} at {}",
                scheduled.token, scheduled.event.name, scheduled.due_at
            );

            fired += 1;
            fire(scheduled)?;
        }

        self.0.write().now = target;

        Ok(fired)
    }

    pub fn advance_by<F>(&self, duration: Duration, fire: F) -> Result<usize>
    where
        F: FnMut(ScheduledEvent) -> Result<()>,
    {
        let target = self.offset(duration)?;

        self.advance_to(target, fire)
    }

    fn offset(&self, duration: Duration) -> Result<LogicalTime> {
        self.now()
            .checked_add(duration)
            .ok_or(Error::TimeOverflow(duration))
    }
}
