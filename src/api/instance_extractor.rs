use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::api::error::ApiError;
use crate::api::handlers::AppState;
use crate::logic::{DirectoryResult, InstanceDirectory};
use crate::model::{Id, Instance};
use crate::store::Store;

/// The instance targeted by the current request.
///
/// Resolved once from the `:instance_id` path segment before the handler runs,
/// then handed to the handler by value.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceContext {
    instance: Instance,
}

impl InstanceContext {
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn into_instance(self) -> Instance {
        self.instance
    }
}

/// Resolve `instance_id` into a request context
pub async fn bind<S: Store>(
    directory: &InstanceDirectory<S>,
    instance_id: &Id,
) -> DirectoryResult<InstanceContext> {
    log::debug!("Loading instance instance_id={}", instance_id);
    let instance = directory.resolve_by_internal_id(instance_id).await?;
    Ok(InstanceContext { instance })
}

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for InstanceContext
where
    S: Store + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let Path(instance_id) = Path::<Id>::from_request_parts(parts, state).await?;
        Ok(bind(&state.directory, &instance_id).await?)
    }
}
