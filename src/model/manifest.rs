use serde::{Deserialize, Serialize};

use crate::config::ManifestConfig;

/// Static service metadata served from `/manifest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub name: String,
    pub description: String,
}

impl Manifest {
    pub fn from_config(config: &ManifestConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: config.name.clone(),
            description: config.description.clone(),
        }
    }
}
