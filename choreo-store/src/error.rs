use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("saga `{0}` not found")]
    SagaNotFound(Uuid),

    #[error("metadata must be an object")]
    MetadataInvalidObjectType,

    #[error("serde_json `{0}`")]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
