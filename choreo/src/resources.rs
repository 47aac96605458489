use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    fmt,
};
use tracing::debug;

/// Values made available to saga handlers, one per type.
///
/// Registered with [`SagaTestFixture::data`](crate::SagaTestFixture::data)
/// and read through [`SagaContext::get`](crate::SagaContext::get) or
/// [`SagaContext::extract`](crate::SagaContext::extract).
#[derive(Default)]
pub struct Resources {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the previous value of the same type.
    ///
    /// ```
    /// # use choreo::Resources;
    /// let mut resources = Resources::new();
    /// assert_eq!(resources.insert(10u32), None);
    /// assert_eq!(resources.insert(20u32), Some(10u32));
    /// assert_eq!(resources.get::<u32>(), Some(&20u32));
    /// ```
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    /// Like [`Resources::get`] for values the handler cannot work without.
    ///
    /// # Panics
    ///
    /// When no value of type `T` was registered.
    pub fn extract<T: 'static>(&self) -> &T {
        match self.get::<T>() {
            Some(value) => value,
            None => {
                debug!(
                    "resource `{}` is missing, register it with `SagaTestFixture::data()` \
                     using the same type the handler extracts",
                    type_name::<T>()
                );

                panic!("saga resource is not registered, enable debug logs for details");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("len", &self.values.len())
            .finish()
    }
}
