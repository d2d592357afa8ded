use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Errors surfaced across the query boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Symbol '{name}' not found after scanning {scanned_files} files")]
    SymbolNotFound { name: String, scanned_files: usize },
    #[error("No project: {0}")]
    NoProject(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    SymbolNotFound,
    NoProject,
    InvalidArgument,
    Internal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_files: Option<usize>,
}

impl From<&ApiError> for ErrorInfo {
    fn from(err: &ApiError) -> Self {
        let (code, scanned_files) = match err {
            ApiError::SymbolNotFound { scanned_files, .. } => {
                (ErrorCode::SymbolNotFound, Some(*scanned_files))
            }
            ApiError::NoProject(_) => (ErrorCode::NoProject, None),
            ApiError::InvalidArgument(_) => (ErrorCode::InvalidArgument, None),
            ApiError::Internal(_) => (ErrorCode::Internal, None),
        };
        ErrorInfo {
            code,
            message: err.to_string(),
            scanned_files,
        }
    }
}

/// Envelope every query result is returned in; errors are data, never panics.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryResponse<T> {
    Ok { data: T },
    Error { error: ErrorInfo },
}

impl<T> QueryResponse<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, QueryResponse::Ok { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryResponse::Ok { data } => Some(data),
            QueryResponse::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            QueryResponse::Ok { .. } => None,
            QueryResponse::Error { error } => Some(error),
        }
    }
}

impl<T> From<ApiResult<T>> for QueryResponse<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => QueryResponse::Ok { data },
            Err(err) => QueryResponse::Error {
                error: ErrorInfo::from(&err),
            },
        }
    }
}
