use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::model::{Id, Instance};
use crate::store::traits::{InstanceStore, StoreError, StoreResult};

/// In-process store keyed by internal id.
///
/// The external id uniqueness check and the insert happen under one write lock,
/// so concurrent creations with the same external id cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    instances: RwLock<HashMap<Id, Instance>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: number of stored records
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Test helper
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Test helper: number of live records carrying `external_id`
    pub fn count_external_id(&self, external_id: &str) -> usize {
        self.instances
            .read()
            .values()
            .filter(|instance| instance.external_id == external_id)
            .count()
    }
}

#[async_trait::async_trait]
impl InstanceStore for MemoryStore {
    async fn get_instance(&self, id: &Id) -> StoreResult<Option<Instance>> {
        Ok(self.instances.read().get(id).cloned())
    }

    async fn get_instance_by_external_id(&self, external_id: &str) -> StoreResult<Option<Instance>> {
        Ok(self
            .instances
            .read()
            .values()
            .find(|instance| instance.external_id == external_id)
            .cloned())
    }

    async fn insert_instance(&self, mut instance: Instance) -> StoreResult<Instance> {
        let mut instances = self.instances.write();

        if instances
            .values()
            .any(|existing| existing.external_id == instance.external_id)
        {
            return Err(StoreError::DuplicateExternalId(instance.external_id));
        }
        if instances.contains_key(&instance.id) {
            return Err(anyhow::anyhow!("instance id '{}' already stored", instance.id).into());
        }

        let now = Utc::now();
        instance.created_at = now;
        instance.updated_at = now;
        instances.insert(instance.id.clone(), instance.clone());

        Ok(instance)
    }

    async fn update_instance(&self, mut instance: Instance) -> StoreResult<Option<Instance>> {
        let mut instances = self.instances.write();

        let Some(existing) = instances.get_mut(&instance.id) else {
            return Ok(None);
        };

        // Identity and creation time are fixed once stored
        instance.external_id = existing.external_id.clone();
        instance.created_at = existing.created_at;
        instance.updated_at = Utc::now();
        *existing = instance.clone();

        Ok(Some(instance))
    }

    async fn delete_instance(&self, id: &Id) -> StoreResult<bool> {
        Ok(self.instances.write().remove(id).is_some())
    }
}
