pub mod generate;
pub mod mappings;
pub mod training;

use serde::de::DeserializeOwned;

use splunked_common::{MappingType, SplunkedError};

use crate::error::ApiError;

// --- Helpers ---

/// Parse a JSON request body. An empty or malformed body is a client error.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(SplunkedError::Validation("Request body must be JSON".to_string()).into());
    }
    serde_json::from_slice(body)
        .map_err(|e| SplunkedError::Validation(format!("Invalid JSON body: {e}")).into())
}

pub(crate) fn resolve_type(type_name: &str) -> Result<MappingType, ApiError> {
    MappingType::resolve(type_name)
        .ok_or_else(|| SplunkedError::UnknownMappingType(type_name.to_string()).into())
}
