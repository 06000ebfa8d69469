use crate::model::{Id, Instance};

/// Failures raised by an [`InstanceStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend's uniqueness constraint on the external identifier rejected a write
    #[error("an instance with external id '{0}' already exists")]
    DuplicateExternalId(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable keyed storage for instance records.
///
/// Implementations own the lifecycle timestamps and must enforce uniqueness of
/// `Instance::external_id` on insert.
#[async_trait::async_trait]
pub trait InstanceStore: Send + Sync {
    /// Get an instance by its internal id
    async fn get_instance(&self, id: &Id) -> StoreResult<Option<Instance>>;
    /// Get an instance by its caller-supplied external id
    async fn get_instance_by_external_id(&self, external_id: &str) -> StoreResult<Option<Instance>>;
    /// Persist a new instance, returning the stored record
    async fn insert_instance(&self, instance: Instance) -> StoreResult<Instance>;
    /// Overwrite an existing instance. Returns `None` if no record has that id.
    async fn update_instance(&self, instance: Instance) -> StoreResult<Option<Instance>>;
    /// Remove an instance. Returns `false` if no record has that id.
    async fn delete_instance(&self, id: &Id) -> StoreResult<bool>;
}

pub trait Store: InstanceStore + Send + Sync {}
impl<T: InstanceStore + Send + Sync> Store for T {}
