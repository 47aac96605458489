use chrono::Duration;
use choreo_store::{MemorySagaStore, Message};
use tracing::info;

use crate::{
    config::FixtureConfig,
    error::{Error, Result},
    recorder::{CallbackBehavior, RecordingCommandChannel, RecordingEventChannel},
    resources::Resources,
    result::FixtureExecutionResult,
    saga::{Infrastructure, SagaRule},
    scheduler::EventScheduler,
    time::LogicalTime,
};

/// Given-When-Then driver for one saga type.
///
/// The "given" steps bring the saga into a known state without recording
/// anything. Each "when" step opens a fresh recording window, triggers the
/// saga and hands back the [`FixtureExecutionResult`] to assert on.
///
/// ```rust,ignore
/// let mut fixture = SagaTestFixture::new(order_saga());
///
/// fixture
///     .given_published([Message::from_payload(&OrderPlaced { order_id })?])?
///     .when_time_elapses(Duration::minutes(30))?
///     .expect_dispatched_commands_equal_to(&[Message::from_payload(&CancelOrder { order_id })?])?
///     .expect_active_sagas(0)?;
/// ```
pub struct SagaTestFixture {
    rule: SagaRule,
    config: FixtureConfig,
    resources: Resources,
    infra: Infrastructure,
    result: FixtureExecutionResult,
}

impl SagaTestFixture {
    pub fn new(rule: SagaRule) -> Self {
        Self::with_config(rule, FixtureConfig::default())
    }

    pub fn with_config(rule: SagaRule, config: FixtureConfig) -> Self {
        let infra = Infrastructure {
            scheduler: EventScheduler::starting_at(config.start_time),
            ..Default::default()
        };

        let result = FixtureExecutionResult::new(
            infra.store.clone(),
            infra.scheduler.clone(),
            infra.events.clone(),
            infra.commands.clone(),
            rule.saga_type(),
        );

        Self {
            rule,
            config,
            resources: Resources::new(),
            infra,
            result,
        }
    }

    pub fn data<V: Send + Sync + 'static>(mut self, value: V) -> Self {
        self.resources.insert(value);
        self
    }

    pub fn callback_behavior<B: CallbackBehavior + 'static>(self, behavior: B) -> Self {
        self.infra.commands.set_callback_behavior(behavior);
        self
    }

    pub fn current_time(&self) -> LogicalTime {
        self.infra.scheduler.now()
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.infra.scheduler
    }

    pub fn store(&self) -> &MemorySagaStore {
        &self.infra.store
    }

    pub fn commands(&self) -> &RecordingCommandChannel {
        &self.infra.commands
    }

    pub fn events(&self) -> &RecordingEventChannel {
        &self.infra.events
    }

    pub fn result(&self) -> &FixtureExecutionResult {
        &self.result
    }

    pub fn given_no_prior_activity(&mut self) -> &mut Self {
        info!("{} given no prior activity", self.rule.saga_type());
        self
    }

    pub fn given_published<I>(&mut self, events: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Message>,
    {
        for event in events {
            info!("{} given {}", self.rule.saga_type(), event.name);
            self.deliver(event)?;
        }

        Ok(self)
    }

    pub fn and_then_published<I>(&mut self, events: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Message>,
    {
        self.given_published(events)
    }

    pub fn and_then_time_elapses(&mut self, duration: Duration) -> Result<&mut Self> {
        let target = self.offset(duration)?;

        self.and_then_time_advances_to(target)
    }

    pub fn and_then_time_advances_to(&mut self, time: LogicalTime) -> Result<&mut Self> {
        info!("{} given time advances to {time}", self.rule.saga_type());
        self.advance(time)?;

        Ok(self)
    }

    pub fn when_publishing(&mut self, event: Message) -> Result<&FixtureExecutionResult> {
        self.result.start_recording();

        info!("{} when {}", self.rule.saga_type(), event.name);
        self.deliver(event)?;

        Ok(&self.result)
    }

    pub fn when_time_elapses(&mut self, duration: Duration) -> Result<&FixtureExecutionResult> {
        let target = self.offset(duration)?;

        self.when_time_advances_to(target)
    }

    pub fn when_time_advances_to(&mut self, time: LogicalTime) -> Result<&FixtureExecutionResult> {
        self.result.start_recording();

        info!("{} when time advances to {time}", self.rule.saga_type());
        self.advance(time)?;

        Ok(&self.result)
    }

    fn deliver(&self, event: Message) -> Result<usize> {
        self.rule
            .dispatch(event, &self.infra, &self.resources, &self.config)
    }

    fn advance(&self, time: LogicalTime) -> Result<usize> {
        let Self {
            rule,
            config,
            resources,
            infra,
            ..
        } = self;

        infra.scheduler.advance_to(time, |scheduled| {
            rule.dispatch(scheduled.event, infra, resources, config)
                .map(|_| ())
        })
    }

    fn offset(&self, duration: Duration) -> Result<LogicalTime> {
        self.current_time()
            .checked_add(duration)
            .ok_or(Error::TimeOverflow(duration))
    }
}
