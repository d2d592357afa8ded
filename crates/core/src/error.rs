use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracescopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No project: {0}")]
    NoProject(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Symbol '{name}' not found after scanning {scanned_files} files")]
    SymbolNotFound { name: String, scanned_files: usize },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TracescopeError> for tracescope_api::ApiError {
    fn from(err: TracescopeError) -> Self {
        use tracescope_api::ApiError;
        match err {
            TracescopeError::SymbolNotFound {
                name,
                scanned_files,
            } => ApiError::SymbolNotFound {
                name,
                scanned_files,
            },
            TracescopeError::NoProject(msg) => ApiError::NoProject(msg),
            TracescopeError::InvalidArgument(msg) | TracescopeError::Config(msg) => {
                ApiError::InvalidArgument(msg)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TracescopeError>;
