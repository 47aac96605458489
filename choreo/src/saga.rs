//! Routing of events to saga instances.
//!
//! A [`SagaRule`] lists handlers for one saga type. Each handler is keyed by
//! an event-name glob and the association key read from the event data.
//!
//! ```rust,ignore
//! let rule = SagaRule::of::<OrderSaga>()
//!     .start("order-placed", "order_id", CreationPolicy::IfNoneFound, OnOrderPlaced)
//!     .handler("payment-*", "order_id", OnPayment);
//! ```

use chrono::Duration;
use choreo_store::{AssociationValue, MemorySagaStore, Message, SagaInfo, StoreError};
use dyn_clone::DynClone;
use glob_match::glob_match;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::FixtureConfig,
    error::{Error, Result},
    recorder::{RecordingCommandChannel, RecordingEventChannel},
    resources::Resources,
    scheduler::{EventScheduler, ScheduleToken},
    time::LogicalTime,
};

/// Whether an incoming event starts a new saga instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreationPolicy {
    /// Only existing sagas handle the event.
    #[default]
    None,
    /// Start a saga when no existing one holds the association.
    IfNoneFound,
    /// Always start a saga, existing ones handle the event as well.
    Always,
}

pub trait SagaHandler: DynClone + Send + Sync {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()>;
}

dyn_clone::clone_trait_object!(SagaHandler);

#[derive(Clone)]
struct Route {
    filter: String,
    association_key: String,
    policy: CreationPolicy,
    handler: Box<dyn SagaHandler>,
}

#[derive(Clone)]
pub struct SagaRule {
    saga_type: String,
    routes: Vec<Route>,
}

impl SagaRule {
    pub fn new<T: Into<String>>(saga_type: T) -> Self {
        Self {
            saga_type: saga_type.into(),
            routes: Vec::new(),
        }
    }

    pub fn of<S: SagaInfo>() -> Self {
        Self::new(S::saga_type())
    }

    /// Handles events named like `filter` on sagas already associated with
    /// the event's `association_key` property.
    pub fn handler<H: SagaHandler + 'static>(
        self,
        filter: impl Into<String>,
        association_key: impl Into<String>,
        handler: H,
    ) -> Self {
        self.start(filter, association_key, CreationPolicy::None, handler)
    }

    pub fn start<H: SagaHandler + 'static>(
        mut self,
        filter: impl Into<String>,
        association_key: impl Into<String>,
        policy: CreationPolicy,
        handler: H,
    ) -> Self {
        self.routes.push(Route {
            filter: filter.into(),
            association_key: association_key.into(),
            policy,
            handler: Box::new(handler),
        });

        self
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    /// Delivers `event` and everything it causes to be redelivered.
    ///
    /// Returns the number of events delivered, `event` included.
    pub(crate) fn dispatch(
        &self,
        event: Message,
        infra: &Infrastructure,
        resources: &Resources,
        config: &FixtureConfig,
    ) -> Result<usize> {
        let mut queue = VecDeque::from([event]);
        let mut delivered = 0;

        while let Some(event) = queue.pop_front() {
            if delivered == config.max_cascade {
                return Err(Error::CascadeLimit(config.max_cascade));
            }

            delivered += 1;
            self.route(
                &event,
                infra,
                resources,
                &mut queue,
                config.redeliver_published_events,
            )?;
        }

        Ok(delivered)
    }

    fn route(
        &self,
        event: &Message,
        infra: &Infrastructure,
        resources: &Resources,
        outbox: &mut VecDeque<Message>,
        redeliver: bool,
    ) -> Result<()> {
        for route in self
            .routes
            .iter()
            .filter(|route| glob_match(&route.filter, &event.name))
        {
            let Some(value) = event.property(&route.association_key) else {
                debug!(
                    "{} skipped by {}, no `{}` property",
                    event.name, self.saga_type, route.association_key
                );
                continue;
            };

            let association = AssociationValue::new(route.association_key.to_owned(), value);
            let mut targets = infra.store.find_of(&self.saga_type, &association);

            let create = match route.policy {
                CreationPolicy::None => false,
                CreationPolicy::IfNoneFound => targets.is_empty(),
                CreationPolicy::Always => true,
            };

            if create {
                let id = infra.store.create(self.saga_type.to_owned());
                infra
                    .store
                    .associate(id, association.key.to_owned(), &association.value)?;

                debug!("{} {id} started by {}", self.saga_type, event.name);
                targets.push(id);
            }

            if targets.is_empty() {
                debug!("{} matched no {} for {association}", event.name, self.saga_type);
            }

            for saga_id in targets {
                if !infra.store.is_active(saga_id) {
                    continue;
                }

                debug!("{} {saga_id} handling {}", self.saga_type, event.name);

                let mut ctx = SagaContext {
                    saga_id,
                    infra,
                    resources,
                    outbox: &mut *outbox,
                    redeliver,
                };

                route
                    .handler
                    .handle(event, &mut ctx)
                    .map_err(|err| match err.downcast::<Error>() {
                        Ok(err) => err,
                        Err(err) => Error::Handler(err),
                    })?;
            }
        }

        Ok(())
    }
}

/// Handles shared by the fixture, its result and every saga context.
#[derive(Clone, Default)]
pub(crate) struct Infrastructure {
    pub scheduler: EventScheduler,
    pub commands: RecordingCommandChannel,
    pub events: RecordingEventChannel,
    pub store: MemorySagaStore,
}

/// What a saga instance can do while handling an event.
pub struct SagaContext<'a> {
    saga_id: Uuid,
    infra: &'a Infrastructure,
    resources: &'a Resources,
    outbox: &'a mut VecDeque<Message>,
    redeliver: bool,
}

impl SagaContext<'_> {
    pub fn saga_id(&self) -> Uuid {
        self.saga_id
    }

    pub fn now(&self) -> LogicalTime {
        self.infra.scheduler.now()
    }

    /// Dispatches a command and returns the configured reply.
    pub fn send(&mut self, command: Message) -> Result<Value> {
        self.infra.commands.dispatch(command)
    }

    pub fn publish(&mut self, event: Message) {
        if self.redeliver {
            self.outbox.push_back(event.clone());
        }

        self.infra.events.publish(event);
    }

    pub fn schedule_at(&mut self, time: LogicalTime, event: Message) -> Result<ScheduleToken> {
        self.infra.scheduler.schedule_at(time, event)
    }

    pub fn schedule_after(&mut self, duration: Duration, event: Message) -> Result<ScheduleToken> {
        self.infra.scheduler.schedule_after(duration, event)
    }

    pub fn cancel(&mut self, token: ScheduleToken) -> bool {
        self.infra.scheduler.cancel(token)
    }

    pub fn associate_with(&mut self, key: impl Into<String>, value: impl ToString) -> Result<()> {
        Ok(self.infra.store.associate(self.saga_id, key, value)?)
    }

    pub fn remove_association(
        &mut self,
        key: impl Into<String>,
        value: impl ToString,
    ) -> Result<()> {
        Ok(self.infra.store.disassociate(self.saga_id, key, value)?)
    }

    /// Ends the saga. It keeps handling the current event but receives no
    /// further ones.
    pub fn end(&mut self) -> Result<()> {
        debug!("saga {} ended", self.saga_id);

        Ok(self.infra.store.end(self.saga_id)?)
    }

    pub fn is_active(&self) -> bool {
        self.infra.store.is_active(self.saga_id)
    }

    /// Saga state, or `S::default()` when none was saved yet.
    pub fn state<S: DeserializeOwned + Default>(&self) -> Result<S> {
        let saga = self
            .infra
            .store
            .get(self.saga_id)
            .ok_or(StoreError::SagaNotFound(self.saga_id))?;

        if saga.state.is_null() {
            return Ok(S::default());
        }

        Ok(serde_json::from_value(saga.state).map_err(StoreError::from)?)
    }

    pub fn save_state<S: Serialize>(&mut self, state: &S) -> Result<()> {
        let value = serde_json::to_value(state).map_err(StoreError::from)?;

        Ok(self.infra.store.save_state(self.saga_id, value)?)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.resources.get::<T>()
    }

    pub fn extract<T: 'static>(&self) -> &T {
        self.resources.extract::<T>()
    }
}
