use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    sync::Arc,
};
use uuid::Uuid;

use crate::error::{Result, StoreError};

pub trait SagaInfo {
    fn saga_type() -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssociationValue {
    pub key: String,
    pub value: String,
}

impl AssociationValue {
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for AssociationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key:<{}> value:<{}>", self.key, self.value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaInstance {
    pub id: Uuid,
    pub saga_type: String,
    pub associations: BTreeSet<AssociationValue>,
    pub active: bool,
    pub state: Value,
    seq: u64,
}

#[derive(Debug, Default)]
struct Sagas {
    next_seq: u64,
    instances: HashMap<Uuid, SagaInstance>,
    index: HashMap<AssociationValue, BTreeSet<Uuid>>,
}

impl Sagas {
    fn instance_mut(&mut self, id: Uuid) -> Result<&mut SagaInstance> {
        self.instances
            .get_mut(&id)
            .ok_or(StoreError::SagaNotFound(id))
    }

    fn unindex(&mut self, id: Uuid, association: &AssociationValue) {
        let Some(ids) = self.index.get_mut(association) else {
            return;
        };

        ids.remove(&id);

        if ids.is_empty() {
            self.index.remove(association);
        }
    }
}

/// Saga instances and their association index, kept in memory.
///
/// Cloning yields another handle on the same store. Ended sagas are kept as
/// inactive instances with their last associations, but they never count as
/// active and never appear in the index.
#[derive(Debug, Clone, Default)]
pub struct MemorySagaStore(Arc<RwLock<Sagas>>);

impl MemorySagaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, saga_type: impl Into<String>) -> Uuid {
        let mut sagas = self.0.write();
        let id = Uuid::new_v4();
        let seq = sagas.next_seq;
        sagas.next_seq += 1;

        sagas.instances.insert(
            id,
            SagaInstance {
                id,
                saga_type: saga_type.into(),
                associations: BTreeSet::new(),
                active: true,
                state: Value::Null,
                seq,
            },
        );

        id
    }

    /// Associating an ended saga is a no-op.
    pub fn associate(&self, id: Uuid, key: impl Into<String>, value: impl ToString) -> Result<()> {
        let association = AssociationValue::new(key, value);
        let mut sagas = self.0.write();
        let saga = sagas.instance_mut(id)?;

        if !saga.active {
            return Ok(());
        }

        saga.associations.insert(association.clone());
        sagas.index.entry(association).or_default().insert(id);

        Ok(())
    }

    /// Removing an association the saga does not hold is a no-op.
    pub fn disassociate(
        &self,
        id: Uuid,
        key: impl Into<String>,
        value: impl ToString,
    ) -> Result<()> {
        let association = AssociationValue::new(key, value);
        let mut sagas = self.0.write();

        if !sagas.instance_mut(id)?.associations.remove(&association) {
            return Ok(());
        }

        sagas.unindex(id, &association);

        Ok(())
    }

    /// Marks the saga inactive and drops all of its index entries.
    pub fn end(&self, id: Uuid) -> Result<()> {
        let mut sagas = self.0.write();
        let saga = sagas.instance_mut(id)?;

        if !saga.active {
            return Ok(());
        }

        saga.active = false;
        let associations = saga.associations.clone();

        for association in associations.iter() {
            sagas.unindex(id, association);
        }

        Ok(())
    }

    pub fn save_state(&self, id: Uuid, state: Value) -> Result<()> {
        self.0.write().instance_mut(id)?.state = state;

        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<SagaInstance> {
        self.0.read().instances.get(&id).cloned()
    }

    pub fn is_active(&self, id: Uuid) -> bool {
        self.0
            .read()
            .instances
            .get(&id)
            .map(|saga| saga.active)
            .unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.0
            .read()
            .instances
            .values()
            .filter(|saga| saga.active)
            .count()
    }

    pub fn active_count_of(&self, saga_type: &str) -> usize {
        self.0
            .read()
            .instances
            .values()
            .filter(|saga| saga.active && saga.saga_type == saga_type)
            .count()
    }

    pub fn has_association(&self, key: &str, value: &str) -> bool {
        !self.find(key, value).is_empty()
    }

    pub fn find(&self, key: &str, value: &str) -> BTreeSet<Uuid> {
        self.0
            .read()
            .index
            .get(&AssociationValue::new(key, value))
            .cloned()
            .unwrap_or_default()
    }

    /// Active sagas of `saga_type` holding `association`, oldest first.
    pub fn find_of(&self, saga_type: &str, association: &AssociationValue) -> Vec<Uuid> {
        let sagas = self.0.read();
        let Some(ids) = sagas.index.get(association) else {
            return Vec::new();
        };

        let mut found = ids
            .iter()
            .filter_map(|id| sagas.instances.get(id))
            .filter(|saga| saga.saga_type == saga_type)
            .collect::<Vec<_>>();

        found.sort_by_key(|saga| saga.seq);

        found.into_iter().map(|saga| saga.id).collect()
    }
}
