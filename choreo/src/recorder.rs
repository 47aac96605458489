use choreo_store::Message;
use dyn_clone::DynClone;
use parking_lot::RwLock;
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub message: Message,
    pub order: u64,
}

pub type RecordedCommand = Recorded;
pub type RecordedEvent = Recorded;

#[derive(Debug, Default)]
struct Recording {
    next_order: u64,
    items: Vec<Recorded>,
}

/// Append-only capture of messages in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<RwLock<Recording>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, message: Message) -> u64 {
        let mut recording = self.0.write();
        let order = recording.next_order;
        recording.next_order += 1;
        recording.items.push(Recorded { message, order });

        order
    }

    pub fn snapshot(&self) -> Vec<Recorded> {
        self.0.read().items.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.0
            .read()
            .items
            .iter()
            .map(|recorded| recorded.message.clone())
            .collect()
    }

    pub fn reset(&self) {
        let mut recording = self.0.write();
        recording.items.clear();
        recording.next_order = 0;
    }

    pub fn len(&self) -> usize {
        self.0.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().items.is_empty()
    }
}

/// Reply given to a saga for each command it dispatches.
pub trait CallbackBehavior: DynClone + Send + Sync {
    fn handle(&self, command: &Message) -> anyhow::Result<Value>;
}

dyn_clone::clone_trait_object!(CallbackBehavior);

/// Replies `null` to every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReply;

impl CallbackBehavior for NullReply {
    fn handle(&self, _command: &Message) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }
}

/// Command channel that records instead of dispatching.
#[derive(Clone)]
pub struct RecordingCommandChannel {
    recorder: Recorder,
    callback: Arc<RwLock<Box<dyn CallbackBehavior>>>,
}

impl RecordingCommandChannel {
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new(),
            callback: Arc::new(RwLock::new(Box::new(NullReply))),
        }
    }

    pub fn set_callback_behavior<B: CallbackBehavior + 'static>(&self, behavior: B) {
        *self.callback.write() = Box::new(behavior);
    }

    /// Records the command, then answers with the configured callback
    /// behavior.
    pub fn dispatch(&self, command: Message) -> Result<Value> {
        let order = self.recorder.record(command.clone());
        debug!("command #{order} {} dispatched", command.name);

        let callback = self.callback.read().clone();

        Ok(callback.handle(&command)?)
    }

    pub fn snapshot(&self) -> Vec<RecordedCommand> {
        self.recorder.snapshot()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.recorder.messages()
    }

    pub fn reset(&self) {
        self.recorder.reset()
    }
}

impl fmt::Debug for RecordingCommandChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingCommandChannel")
            .field("recorder", &self.recorder)
            .finish()
    }
}

impl Default for RecordingCommandChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Event channel that records every published event.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventChannel {
    recorder: Recorder,
}

impl RecordingEventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: Message) -> u64 {
        let order = self.recorder.record(event);
        debug!("event #{order} published");

        order
    }

    pub fn snapshot(&self) -> Vec<RecordedEvent> {
        self.recorder.snapshot()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.recorder.messages()
    }

    pub fn reset(&self) {
        self.recorder.reset()
    }
}
