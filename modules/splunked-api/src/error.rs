use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use splunked_common::SplunkedError;

/// Handler error. Renders as `{"error": "..."}` with a status picked from the
/// error kind.
#[derive(Debug)]
pub struct ApiError(pub SplunkedError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SplunkedError::Validation(_) => StatusCode::BAD_REQUEST,
            SplunkedError::NotFound { .. } | SplunkedError::UnknownMappingType(_) => {
                StatusCode::NOT_FOUND
            }
            SplunkedError::Config(_) | SplunkedError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SplunkedError> for ApiError {
    fn from(err: SplunkedError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SplunkedError>() {
            Ok(typed) => ApiError(typed),
            Err(other) => ApiError(SplunkedError::Anyhow(other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_error_kind() {
        let validation = ApiError::from(SplunkedError::Validation("bad".into()));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let missing = ApiError::from(SplunkedError::NotFound {
            kind: "pattern".into(),
            id: "pf_x".into(),
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let unknown = ApiError::from(SplunkedError::UnknownMappingType("widgets".into()));
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = ApiError::from(anyhow::anyhow!("disk I/O error"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn typed_errors_survive_anyhow() {
        let wrapped: anyhow::Error = SplunkedError::Validation("dup".into()).into();
        assert_eq!(ApiError::from(wrapped).status(), StatusCode::BAD_REQUEST);
    }
}
