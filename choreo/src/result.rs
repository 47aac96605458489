use chrono::Duration;
use choreo_store::{MemorySagaStore, Message, PayloadType};
use serde::Serialize;

use crate::{
    error::Result,
    matcher::Matcher,
    matchers,
    recorder::{RecordingCommandChannel, RecordingEventChannel},
    scheduler::EventScheduler,
    time::LogicalTime,
    validator::{
        CommandValidator, EventSchedulerValidator, EventValidator, RepositoryContentValidator,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Expectations on what the saga did during the "when" step.
///
/// Every `expect_*` method returns the result itself, so expectations chain
/// with `?`. The first failing one ends the chain.
///
/// ```rust,ignore
/// fixture
///     .when_time_elapses(Duration::days(1))?
///     .expect_dispatched_commands_equal_to(&[Message::from_payload(&CancelOrder { order_id })?])?
///     .expect_active_sagas(0)?;
/// ```
#[derive(Debug, Clone)]
pub struct FixtureExecutionResult {
    state: RecordingState,
    commands: CommandValidator,
    events: EventValidator,
    scheduled: EventSchedulerValidator,
    repository: RepositoryContentValidator,
}

impl FixtureExecutionResult {
    pub fn new(
        store: MemorySagaStore,
        scheduler: EventScheduler,
        events: RecordingEventChannel,
        commands: RecordingCommandChannel,
        saga_type: impl Into<String>,
    ) -> Self {
        Self {
            state: RecordingState::Idle,
            commands: CommandValidator::new(commands),
            events: EventValidator::new(events),
            scheduled: EventSchedulerValidator::new(scheduler),
            repository: RepositoryContentValidator::new(store, saga_type),
        }
    }

    /// Opens a fresh recording window for commands and events.
    ///
    /// Saga instances and scheduled events are left untouched, they belong to
    /// the state the "when" step starts from.
    pub fn start_recording(&mut self) {
        self.commands.start_recording();
        self.events.start_recording();
        self.state = RecordingState::Recording;
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn expect_active_sagas(&self, expected: usize) -> Result<&Self> {
        self.repository.assert_active_sagas(expected)?;
        Ok(self)
    }

    pub fn expect_association_with(&self, key: &str, value: impl ToString) -> Result<&Self> {
        self.repository
            .assert_association_present(key, &value.to_string())?;
        Ok(self)
    }

    pub fn expect_no_association_with(&self, key: &str, value: impl ToString) -> Result<&Self> {
        self.repository
            .assert_no_association_present(key, &value.to_string())?;
        Ok(self)
    }

    pub fn expect_scheduled_event_matching(
        &self,
        duration: Duration,
        matcher: &Matcher<Message>,
    ) -> Result<&Self> {
        self.scheduled
            .assert_scheduled_event_matching(duration, matcher)?;
        Ok(self)
    }

    pub fn expect_scheduled_event<P: PayloadType + Serialize>(
        &self,
        duration: Duration,
        payload: &P,
    ) -> Result<&Self> {
        self.expect_scheduled_event_matching(duration, &matchers::payload_equal_to(payload)?)
    }

    pub fn expect_scheduled_event_of_type<P: PayloadType>(
        &self,
        duration: Duration,
    ) -> Result<&Self> {
        self.expect_scheduled_event_matching(duration, &matchers::payload_of_type::<P>())
    }

    pub fn expect_scheduled_event_matching_at(
        &self,
        at: LogicalTime,
        matcher: &Matcher<Message>,
    ) -> Result<&Self> {
        self.scheduled
            .assert_scheduled_event_matching_at(at, matcher)?;
        Ok(self)
    }

    pub fn expect_scheduled_event_at<P: PayloadType + Serialize>(
        &self,
        at: LogicalTime,
        payload: &P,
    ) -> Result<&Self> {
        self.expect_scheduled_event_matching_at(at, &matchers::payload_equal_to(payload)?)
    }

    pub fn expect_scheduled_event_of_type_at<P: PayloadType>(
        &self,
        at: LogicalTime,
    ) -> Result<&Self> {
        self.expect_scheduled_event_matching_at(at, &matchers::payload_of_type::<P>())
    }

    pub fn expect_dispatched_commands_equal_to(&self, expected: &[Message]) -> Result<&Self> {
        self.commands.assert_dispatched_equal_to(expected)?;
        Ok(self)
    }

    pub fn expect_dispatched_commands_matching(
        &self,
        matcher: &Matcher<[Message]>,
    ) -> Result<&Self> {
        self.commands.assert_dispatched_matching(matcher)?;
        Ok(self)
    }

    pub fn expect_no_dispatched_commands(&self) -> Result<&Self> {
        self.expect_dispatched_commands_matching(&matchers::no_commands())
    }

    pub fn expect_no_scheduled_events(&self) -> Result<&Self> {
        self.scheduled.assert_no_scheduled_events()?;
        Ok(self)
    }

    pub fn expect_published_events_matching(&self, matcher: &Matcher<[Message]>) -> Result<&Self> {
        self.events.assert_published_matching(matcher)?;
        Ok(self)
    }

    pub fn expect_published_events(&self, expected: &[Message]) -> Result<&Self> {
        self.events.assert_published_equal_to(expected)?;
        Ok(self)
    }
}
