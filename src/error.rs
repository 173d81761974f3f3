use thiserror::Error;

#[derive(Error, Debug)]
pub enum NlqError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Schema introspection error: {0}")]
    Introspection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("External generator error: {0}")]
    ExternalGenerator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NlqError>;
