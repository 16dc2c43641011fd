//! HTTP surface around the SPL composer, the mapping catalog, and training
//! content.

pub mod error;
pub mod rest;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use splunked_store::{CatalogSource, MappingStore, TrainingStore};

pub struct AppState {
    /// Snapshot source for SPL generation.
    pub catalog: Arc<dyn CatalogSource>,
    pub mappings: MappingStore,
    pub training: TrainingStore,
}

impl AppState {
    /// State where generation reads from the same store the mappings API edits.
    pub fn new(mappings: MappingStore, training: TrainingStore) -> Self {
        Self {
            catalog: Arc::new(mappings.clone()),
            mappings,
            training,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // SPL composer
        .route("/api/generate-spl", post(rest::generate::api_generate_spl))
        // Mapping catalog
        .route("/api/mappings", get(rest::mappings::api_mappings))
        .route(
            "/api/mappings/{type_name}",
            get(rest::mappings::api_mappings_by_type).post(rest::mappings::api_create_mapping),
        )
        .route(
            "/api/mappings/{type_name}/{id}",
            put(rest::mappings::api_update_mapping).delete(rest::mappings::api_delete_mapping),
        )
        // Training content
        .route("/api/training/index", get(rest::training::api_training_index))
        .route("/api/training/item/{id}", get(rest::training::api_training_item))
        .route(
            "/api/training/pipelines",
            get(rest::training::api_training_pipelines),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
