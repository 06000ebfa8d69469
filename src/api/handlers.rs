use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::instance_extractor::InstanceContext;
use crate::config::AppConfig;
use crate::logic::InstanceDirectory;
use crate::model::{Instance, InstancePatch, InstanceResponse, Manifest, NewInstance};
use crate::store::Store;

/// Shared, read-only state handed to every request
#[derive(Debug)]
pub struct ApiState<S> {
    pub directory: InstanceDirectory<S>,
    /// Base address reported back on instance creation
    pub endpoint: String,
    pub manifest: Manifest,
}

impl<S: Store> ApiState<S> {
    pub fn new(store: Arc<S>, config: &AppConfig) -> Self {
        Self {
            directory: InstanceDirectory::new(store),
            endpoint: config.api.endpoint.clone(),
            manifest: Manifest::from_config(&config.manifest),
        }
    }
}

pub type AppState<S> = Arc<ApiState<S>>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn get_manifest<S: Store>(State(state): State<AppState<S>>) -> Json<Manifest> {
    Json(state.manifest.clone())
}

pub async fn create_instance<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<NewInstance>, JsonRejection>,
) -> Result<(StatusCode, Json<InstanceResponse>), ApiError> {
    let Json(params) = payload?;
    let instance = state.directory.create(params).await?;

    Ok((
        StatusCode::CREATED,
        Json(InstanceResponse::active(instance, &state.endpoint)),
    ))
}

pub async fn get_instance(context: InstanceContext) -> Json<Instance> {
    Json(context.into_instance())
}

pub async fn update_instance<S: Store>(
    State(state): State<AppState<S>>,
    context: InstanceContext,
    payload: Result<Json<InstancePatch>, JsonRejection>,
) -> Result<Json<Instance>, ApiError> {
    let Json(patch) = payload?;
    let updated = state.directory.update(context.instance(), &patch).await?;
    Ok(Json(updated))
}

pub async fn delete_instance<S: Store>(
    State(state): State<AppState<S>>,
    context: InstanceContext,
) -> Result<StatusCode, ApiError> {
    state.directory.delete(context.instance()).await?;
    Ok(StatusCode::NO_CONTENT)
}
