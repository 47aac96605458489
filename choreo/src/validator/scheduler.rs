use chrono::Duration;
use choreo_store::Message;

use crate::{
    error::{AssertionFailure, Error, Result},
    matcher::Matcher,
    scheduler::EventScheduler,
    time::LogicalTime,
};

use super::describe_list;

#[derive(Debug, Clone)]
pub struct EventSchedulerValidator {
    scheduler: EventScheduler,
}

impl EventSchedulerValidator {
    pub fn new(scheduler: EventScheduler) -> Self {
        Self { scheduler }
    }

    /// Looks for the event `duration` after the current logical time.
    pub fn assert_scheduled_event_matching(
        &self,
        duration: Duration,
        matcher: &Matcher<Message>,
    ) -> Result<()> {
        let at = self
            .scheduler
            .now()
            .checked_add(duration)
            .ok_or(Error::TimeOverflow(duration))?;

        self.assert_scheduled_event_matching_at(at, matcher)
    }

    /// Exactly one event due at exactly `at` must satisfy `matcher`.
    pub fn assert_scheduled_event_matching_at(
        &self,
        at: LogicalTime,
        matcher: &Matcher<Message>,
    ) -> Result<()> {
        let candidates = self
            .scheduler
            .pending_at(at)
            .into_iter()
            .map(|scheduled| scheduled.event)
            .collect::<Vec<_>>();

        let count = candidates
            .iter()
            .filter(|event| matcher.matches(event))
            .count();

        match count {
            1 => Ok(()),
            0 => Err(AssertionFailure::new(format!(
                "Did not find an event at the given schedule time matching given event. Expected <{matcher}> at <{at}>, got {}.",
                describe_list(&candidates)
            ))
            .into()),
            count => Err(Error::AmbiguousMatch {
                at,
                expected: matcher.to_string(),
                count,
            }),
        }
    }

    pub fn assert_no_scheduled_events(&self) -> Result<()> {
        let pending = self.scheduler.all_pending();

        if pending.is_empty() {
            return Ok(());
        }

        let events = pending
            .iter()
            .map(|scheduled| format!("<{}> at <{}>", scheduled.event, scheduled.due_at))
            .collect::<Vec<_>>()
            .join(", ");

        Err(AssertionFailure::new(format!(
            "Expected no scheduled events, got {}: [{events}].",
            pending.len()
        ))
        .into())
    }
}
