use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use splunked_common::{MappingDraft, MappingObject, MappingSet, SplunkedError};

use super::{parse_body, resolve_type};
use crate::error::ApiError;
use crate::AppState;

fn not_found(type_name: &str, id: &str) -> ApiError {
    SplunkedError::NotFound {
        kind: type_name.to_string(),
        id: id.to_string(),
    }
    .into()
}

pub async fn api_mappings(State(state): State<Arc<AppState>>) -> Result<Json<MappingSet>, ApiError> {
    Ok(Json(state.mappings.get_all().await?))
}

pub async fn api_mappings_by_type(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
) -> Result<Json<Vec<MappingObject>>, ApiError> {
    let kind = resolve_type(&type_name)?;
    Ok(Json(state.mappings.list(kind).await?))
}

pub async fn api_create_mapping(
    State(state): State<Arc<AppState>>,
    Path(type_name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let kind = resolve_type(&type_name)?;
    let draft: MappingDraft = parse_body(&body)?;

    let created = state.mappings.create(kind, draft).await?;
    info!(kind = %kind, id = %created.id, "Created mapping");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn api_update_mapping(
    State(state): State<Arc<AppState>>,
    Path((type_name, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<MappingObject>, ApiError> {
    let kind = resolve_type(&type_name)?;
    let patch: MappingDraft = parse_body(&body)?;

    let updated = state
        .mappings
        .update(kind, &id, patch)
        .await?
        .ok_or_else(|| not_found(&type_name, &id))?;
    info!(kind = %kind, id = %id, "Updated mapping");
    Ok(Json(updated))
}

pub async fn api_delete_mapping(
    State(state): State<Arc<AppState>>,
    Path((type_name, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let kind = resolve_type(&type_name)?;

    let deleted = state
        .mappings
        .delete(kind, &id)
        .await?
        .ok_or_else(|| not_found(&type_name, &id))?;
    info!(kind = %kind, id = %id, "Deleted mapping");
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
