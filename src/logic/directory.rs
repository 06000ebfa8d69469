use std::sync::Arc;

use crate::model::{Id, Instance, InstancePatch, NewInstance};
use crate::store::traits::{Store, StoreError};

/// Failures surfaced by the instance directory
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    /// Storage failure. `message` is safe to show callers, `source` is not.
    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: StoreError,
    },
}

impl DirectoryError {
    pub fn not_found(message: &str) -> Self {
        Self::NotFound(message.to_string())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn store(message: &str, source: StoreError) -> Self {
        log::error!("{}: {:#}", message, source);
        Self::Store {
            message: message.to_string(),
            source,
        }
    }
}

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

const DUPLICATE_MESSAGE: &str = "An instance with that UUID already exists";

/// Identity, deduplication and partial-update rules for instance records.
///
/// Holds only a shared handle to the store, so it is cheap to clone per request.
#[derive(Debug)]
pub struct InstanceDirectory<S> {
    store: Arc<S>,
}

impl<S> Clone for InstanceDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> InstanceDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn resolve_by_internal_id(&self, id: &Id) -> DirectoryResult<Instance> {
        match self.store.get_instance(id).await {
            Ok(Some(instance)) => Ok(instance),
            Ok(None) => Err(DirectoryError::not_found("Instance not found")),
            Err(e) => Err(DirectoryError::store("Database error loading instance", e)),
        }
    }

    /// Create a new instance after checking that the external id is unused.
    ///
    /// The lookup is a fast path for a clear error. The store's own uniqueness
    /// constraint decides concurrent races, and its rejection is reported as a
    /// conflict as well.
    pub async fn create(&self, params: NewInstance) -> DirectoryResult<Instance> {
        let NewInstance {
            external_id,
            base_config,
        } = params;

        if external_id.trim().is_empty() {
            return Err(DirectoryError::bad_request("Instance UUID is required"));
        }

        match self.store.get_instance_by_external_id(&external_id).await {
            Ok(Some(_)) => return Err(DirectoryError::Conflict(DUPLICATE_MESSAGE.to_string())),
            Ok(None) => {}
            Err(e) => {
                return Err(DirectoryError::store(
                    "Database error looking up instance",
                    e,
                ))
            }
        }

        let instance = Instance::new(external_id, base_config);
        match self.store.insert_instance(instance).await {
            Ok(created) => {
                log::info!(
                    "Created instance id={} uuid={}",
                    created.id,
                    created.external_id
                );
                Ok(created)
            }
            Err(StoreError::DuplicateExternalId(_)) => {
                Err(DirectoryError::Conflict(DUPLICATE_MESSAGE.to_string()))
            }
            Err(e) => Err(DirectoryError::store("Database error creating instance", e)),
        }
    }

    /// Merge `patch` into a copy of `instance` and persist it.
    pub async fn update(
        &self,
        instance: &Instance,
        patch: &InstancePatch,
    ) -> DirectoryResult<Instance> {
        let mut merged = instance.clone();
        patch.apply_to(&mut merged);

        match self.store.update_instance(merged).await {
            Ok(Some(updated)) => {
                log::info!(
                    "Updated instance id={} config_changed={}",
                    updated.id,
                    !patch.is_empty()
                );
                Ok(updated)
            }
            Ok(None) => Err(DirectoryError::not_found("Instance not found")),
            Err(e) => Err(DirectoryError::store("Database error updating instance", e)),
        }
    }

    /// Permanently remove an instance. Deleting a record that is already gone
    /// reports `NotFound`.
    pub async fn delete(&self, instance: &Instance) -> DirectoryResult<()> {
        match self.store.delete_instance(&instance.id).await {
            Ok(true) => {
                log::info!("Deleted instance id={}", instance.id);
                Ok(())
            }
            Ok(false) => Err(DirectoryError::not_found("Instance not found")),
            Err(e) => Err(DirectoryError::store("Database error deleting instance", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BaseConfig;
    use crate::store::{InstanceStore, MemoryStore, StoreResult};
    use serde_json::json;
    use std::collections::HashSet;

    /// Store whose every operation fails
    struct BrokenStore;

    #[async_trait::async_trait]
    impl InstanceStore for BrokenStore {
        async fn get_instance(&self, _id: &Id) -> StoreResult<Option<Instance>> {
            Err(anyhow::anyhow!("connection refused").into())
        }
        async fn get_instance_by_external_id(&self, _external_id: &str) -> StoreResult<Option<Instance>> {
            Err(anyhow::anyhow!("connection refused").into())
        }
        async fn insert_instance(&self, _instance: Instance) -> StoreResult<Instance> {
            Err(anyhow::anyhow!("connection refused").into())
        }
        async fn update_instance(&self, _instance: Instance) -> StoreResult<Option<Instance>> {
            Err(anyhow::anyhow!("connection refused").into())
        }
        async fn delete_instance(&self, _id: &Id) -> StoreResult<bool> {
            Err(anyhow::anyhow!("connection refused").into())
        }
    }

    /// Store that misses the duplicate on lookup but rejects it on insert,
    /// as happens when two creations race.
    #[derive(Default)]
    struct RacingStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl InstanceStore for RacingStore {
        async fn get_instance(&self, id: &Id) -> StoreResult<Option<Instance>> {
            self.inner.get_instance(id).await
        }
        async fn get_instance_by_external_id(&self, _external_id: &str) -> StoreResult<Option<Instance>> {
            Ok(None)
        }
        async fn insert_instance(&self, instance: Instance) -> StoreResult<Instance> {
            self.inner.insert_instance(instance).await
        }
        async fn update_instance(&self, instance: Instance) -> StoreResult<Option<Instance>> {
            self.inner.update_instance(instance).await
        }
        async fn delete_instance(&self, id: &Id) -> StoreResult<bool> {
            self.inner.delete_instance(id).await
        }
    }

    fn memory_directory() -> InstanceDirectory<MemoryStore> {
        InstanceDirectory::new(Arc::new(MemoryStore::new()))
    }

    fn new_instance(external_id: &str, config: Option<BaseConfig>) -> NewInstance {
        NewInstance {
            external_id: external_id.to_string(),
            base_config: config,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let directory = memory_directory();
        let mut ids = HashSet::new();

        for n in 0..20 {
            let created = directory
                .create(new_instance(&format!("tenant-{}", n), None))
                .await
                .unwrap();
            assert!(!created.id.is_empty());
            assert_ne!(created.id, created.external_id);

            let resolved = directory.resolve_by_internal_id(&created.id).await.unwrap();
            assert_eq!(resolved, created);

            ids.insert(created.id);
        }

        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts_without_mutation() {
        let directory = memory_directory();
        let first = directory
            .create(new_instance("tenant-42", json!({"currency": "USD"}).as_object().cloned()))
            .await
            .unwrap();

        let result = directory
            .create(new_instance("tenant-42", json!({"currency": "EUR"}).as_object().cloned()))
            .await;
        assert!(matches!(result, Err(DirectoryError::Conflict(_))));

        assert_eq!(directory.store().len(), 1);
        let stored = directory.resolve_by_internal_id(&first.id).await.unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_create_race_is_reported_as_conflict() {
        let directory = InstanceDirectory::new(Arc::new(RacingStore::default()));
        directory.create(new_instance("tenant-42", None)).await.unwrap();

        let result = directory.create(new_instance("tenant-42", None)).await;
        assert!(matches!(result, Err(DirectoryError::Conflict(_))));
        assert_eq!(directory.store().inner.count_external_id("tenant-42"), 1);
    }

    #[tokio::test]
    async fn test_create_requires_external_id() {
        let directory = memory_directory();
        let result = directory.create(new_instance("   ", None)).await;
        assert!(matches!(result, Err(DirectoryError::BadRequest(_))));
        assert!(directory.store().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let directory = memory_directory();
        let result = directory.resolve_by_internal_id(&"missing".to_string()).await;
        assert!(matches!(result, Err(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_failures_are_not_conflated_with_not_found() {
        let directory = InstanceDirectory::new(Arc::new(BrokenStore));

        let resolved = directory.resolve_by_internal_id(&"any".to_string()).await;
        assert!(matches!(resolved, Err(DirectoryError::Store { .. })));

        let created = directory.create(new_instance("tenant-1", None)).await;
        match created {
            Err(DirectoryError::Store { message, source }) => {
                assert_eq!(message, "Database error looking up instance");
                assert!(source.to_string().contains("connection refused"));
            }
            other => panic!("expected store error, got {:?}", other),
        }

        let instance = Instance::new("tenant-1".to_string(), None);
        let updated = directory.update(&instance, &InstancePatch::default()).await;
        assert!(matches!(updated, Err(DirectoryError::Store { .. })));

        let deleted = directory.delete(&instance).await;
        assert!(matches!(deleted, Err(DirectoryError::Store { .. })));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_untouched() {
        let directory = InstanceDirectory::new(Arc::new(BrokenStore));
        let instance = Instance::new("tenant-1".to_string(), json!({"a": 1}).as_object().cloned());
        let before = instance.clone();

        let patch = InstancePatch {
            base_config: json!({"a": 2}).as_object().cloned(),
        };
        assert!(directory.update(&instance, &patch).await.is_err());
        assert_eq!(instance, before);
    }

    #[tokio::test]
    async fn test_tenant_lifecycle() {
        let directory = memory_directory();

        let created = directory.create(new_instance("tenant-42", None)).await.unwrap();
        assert_eq!(created.external_id, "tenant-42");
        assert!(created.base_config.is_none());

        let duplicate = directory.create(new_instance("tenant-42", None)).await;
        assert!(matches!(duplicate, Err(DirectoryError::Conflict(_))));
        assert_eq!(directory.store().count_external_id("tenant-42"), 1);

        let resolved = directory.resolve_by_internal_id(&created.id).await.unwrap();
        let patch = InstancePatch {
            base_config: json!({"currency": "USD"}).as_object().cloned(),
        };
        directory.update(&resolved, &patch).await.unwrap();
        let resolved = directory.resolve_by_internal_id(&created.id).await.unwrap();
        assert_eq!(resolved.base_config, json!({"currency": "USD"}).as_object().cloned());

        directory
            .update(&resolved, &InstancePatch::default())
            .await
            .unwrap();
        let resolved = directory.resolve_by_internal_id(&created.id).await.unwrap();
        assert_eq!(resolved.base_config, json!({"currency": "USD"}).as_object().cloned());
        assert_eq!(resolved.id, created.id);
        assert_eq!(resolved.external_id, "tenant-42");

        directory.delete(&resolved).await.unwrap();
        let gone = directory.resolve_by_internal_id(&created.id).await;
        assert!(matches!(gone, Err(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let directory = memory_directory();
        let created = directory.create(new_instance("tenant-1", None)).await.unwrap();

        directory.delete(&created).await.unwrap();
        let again = directory.delete(&created).await;
        assert!(matches!(again, Err(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_deleted_instance_is_not_found() {
        let directory = memory_directory();
        let created = directory.create(new_instance("tenant-1", None)).await.unwrap();
        directory.delete(&created).await.unwrap();

        let result = directory.update(&created, &InstancePatch::default()).await;
        assert!(matches!(result, Err(DirectoryError::NotFound(_))));
    }
}
