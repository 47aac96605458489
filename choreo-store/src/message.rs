use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Name under which payloads of a type travel inside a [`Message`].
///
/// Usually derived with `#[derive(Payload)]`, which uses the kebab-case
/// struct name.
pub trait PayloadType {
    fn payload_type() -> &'static str;
}

/// Envelope for every event and command the harness observes.
///
/// Two messages carry the same payload when their `name` and `data` are
/// equal, see [`Message::same_payload`]. The `id` only identifies one
/// occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub data: Value,
    pub metadata: Option<Value>,
}

pub type EventMessage = Message;
pub type CommandMessage = Message;

impl Message {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_payload<P: PayloadType + Serialize>(payload: &P) -> Result<Self> {
        Self::new(P::payload_type()).data(payload)
    }

    pub fn data<D: Serialize>(mut self, value: D) -> Result<Self> {
        self.data = serde_json::to_value(&value)?;

        Ok(self)
    }

    pub fn to_data<D: DeserializeOwned>(&self) -> Result<D> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    pub fn metadata<M: Serialize>(mut self, value: M) -> Result<Self> {
        let metadata = serde_json::to_value(&value)?;

        if !metadata.is_object() {
            return Err(StoreError::MetadataInvalidObjectType);
        }

        self.metadata = Some(metadata);

        Ok(self)
    }

    pub fn to_metadata<D: DeserializeOwned>(&self) -> Result<Option<D>> {
        if let Some(metadata) = self.metadata.clone() {
            Ok(Some(serde_json::from_value(metadata)?))
        } else {
            Ok(None)
        }
    }

    pub fn is<P: PayloadType>(&self) -> bool {
        self.name == P::payload_type()
    }

    pub fn same_payload(&self, other: &Message) -> bool {
        self.name == other.name && self.data == other.data
    }

    /// Top-level payload property rendered as an association value.
    ///
    /// Strings are returned verbatim, other JSON values through their JSON
    /// text. Missing and `null` properties yield `None`.
    pub fn property(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            Value::Null => None,
            Value::String(value) => Some(value.to_owned()),
            value => Some(value.to_string()),
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::default(),
            data: Value::default(),
            metadata: None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data)
    }
}
