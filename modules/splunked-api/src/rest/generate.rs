use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Json};
use tracing::info;

use splunked_composer::{generate, Composition, CompositionRequest};

use super::parse_body;
use crate::error::ApiError;
use crate::AppState;

/// `POST /api/generate-spl`: fetch the catalog once, then compose.
pub async fn api_generate_spl(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Composition>, ApiError> {
    let request: CompositionRequest = parse_body(&body)?;
    let catalog = state.catalog.catalog().await?;

    let composition = generate(&request, &catalog);
    info!(
        data_sources = request.data_sources.len(),
        includes = request.includes.len(),
        excludes = request.excludes.len(),
        spl_len = composition.spl.len(),
        "Generated SPL"
    );

    Ok(Json(composition))
}
