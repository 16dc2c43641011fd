use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplunkedError {
    #[error("Unknown mapping type: {0}")]
    UnknownMappingType(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
