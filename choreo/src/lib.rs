//! Deterministic Given-When-Then test harness for event-driven sagas.
//!
//! A [`SagaTestFixture`] drives one saga type through a virtual clock, an
//! in-memory saga store and recording command and event channels. Nothing
//! reaches a real bus or the wall clock, so the same test always sees the
//! same sequence of commands, events and scheduled deadlines.

#![forbid(unsafe_code)]

mod config;
mod error;
mod fixture;
mod matcher;
mod recorder;
mod resources;
mod result;
mod saga;
mod scheduler;
mod time;

pub mod matchers;
pub mod validator;

pub use config::*;
pub use error::*;
pub use fixture::*;
pub use matcher::*;
pub use recorder::*;
pub use resources::*;
pub use result::*;
pub use saga::{CreationPolicy, SagaContext, SagaHandler, SagaRule};
pub use scheduler::*;
pub use time::*;

pub use choreo_macro::{Payload, Saga};
pub use choreo_store::{
    AssociationValue, CommandMessage, EventMessage, MemorySagaStore, Message, PayloadType,
    SagaInfo, SagaInstance, StoreError,
};
