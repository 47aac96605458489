use choreo_store::{AssociationValue, MemorySagaStore};

use crate::error::{AssertionFailure, Result};

/// Checks the saga store, scoped to the saga type under test.
#[derive(Debug, Clone)]
pub struct RepositoryContentValidator {
    store: MemorySagaStore,
    saga_type: String,
}

impl RepositoryContentValidator {
    pub fn new(store: MemorySagaStore, saga_type: impl Into<String>) -> Self {
        Self {
            store,
            saga_type: saga_type.into(),
        }
    }

    pub fn assert_active_sagas(&self, expected: usize) -> Result<()> {
        let actual = self.store.active_count_of(&self.saga_type);

        if actual == expected {
            return Ok(());
        }

        Err(AssertionFailure::new(format!(
            "Wrong number of active sagas. Expected <{expected}>, got <{actual}>."
        ))
        .into())
    }

    pub fn assert_association_present(&self, key: &str, value: &str) -> Result<()> {
        let association = AssociationValue::new(key, value);

        if !self.store.find_of(&self.saga_type, &association).is_empty() {
            return Ok(());
        }

        Err(AssertionFailure::new(format!(
            "Expected a saga to be associated with {association}, but found <none>."
        ))
        .into())
    }

    pub fn assert_no_association_present(&self, key: &str, value: &str) -> Result<()> {
        let association = AssociationValue::new(key, value);
        let found = self.store.find_of(&self.saga_type, &association);

        if found.is_empty() {
            return Ok(());
        }

        let ids = found
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Err(AssertionFailure::new(format!(
            "Expected no saga to be associated with {association}, but found <{ids}>."
        ))
        .into())
    }
}
