use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Static service metadata
        .route("/manifest", get(handlers::get_manifest::<S>))
        // Instance management
        .route("/instances", post(handlers::create_instance::<S>))
        .route(
            "/instances/:instance_id",
            get(handlers::get_instance)
                .put(handlers::update_instance::<S>)
                .patch(handlers::update_instance::<S>)
                .delete(handlers::delete_instance::<S>),
        )
}
