use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{generate_id, Id};

/// Configuration document. Only JSON objects are accepted.
pub type BaseConfig = serde_json::Map<String, serde_json::Value>;

/// Lifecycle state reported on creation. There is no state machine behind it.
pub const ACTIVE_STATE: &str = "active";

/// A tenant record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Internal identifier, generated once at creation and used as the resource key
    pub id: Id,
    /// Caller-supplied external identifier, unique across live instances
    #[serde(rename = "uuid")]
    pub external_id: String,
    /// Opaque configuration document, replaced wholesale on update
    #[serde(rename = "config", default, skip_serializing_if = "Option::is_none")]
    pub base_config: Option<BaseConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    /// Build a new record with a freshly generated internal id
    pub fn new(external_id: String, base_config: Option<BaseConfig>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            external_id,
            base_config,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input model for creating a new instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInstance {
    #[serde(rename = "uuid", default)]
    pub external_id: String,
    #[serde(rename = "config", default)]
    pub base_config: Option<BaseConfig>,
}

/// Partial update for an instance. Absent fields leave the record untouched.
///
/// An explicit `"config": null` is treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstancePatch {
    #[serde(rename = "config", default)]
    pub base_config: Option<BaseConfig>,
}

impl InstancePatch {
    pub fn is_empty(&self) -> bool {
        self.base_config.is_none()
    }

    /// Merge the supplied fields into `instance`
    pub fn apply_to(&self, instance: &mut Instance) {
        if let Some(config) = &self.base_config {
            instance.base_config = Some(config.clone());
        }
    }
}

/// Creation response: the record plus presentation-only fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceResponse {
    #[serde(flatten)]
    pub instance: Instance,
    pub endpoint: String,
    pub state: String,
}

impl InstanceResponse {
    pub fn active(instance: Instance, endpoint: &str) -> Self {
        Self {
            instance,
            endpoint: endpoint.to_string(),
            state: ACTIVE_STATE.to_string(),
        }
    }
}
