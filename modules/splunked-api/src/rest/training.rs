use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};

use splunked_common::{Pipeline, SplunkedError, TrainingIndex, TrainingModule};

use crate::error::ApiError;
use crate::AppState;

pub async fn api_training_index(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrainingIndex>, ApiError> {
    Ok(Json(state.training.index().await?))
}

pub async fn api_training_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TrainingModule>, ApiError> {
    let module = state.training.item(&id).await?.ok_or_else(|| SplunkedError::NotFound {
        kind: "training item".to_string(),
        id,
    })?;
    Ok(Json(module))
}

pub async fn api_training_pipelines(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Pipeline>>, ApiError> {
    Ok(Json(state.training.pipelines().await?))
}
