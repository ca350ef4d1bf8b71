use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Internal server error")]
    Internal,
    #[error("File not found")]
    NotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = match self {
            ApiError::BadRequest(msg) => msg,
            _ => self.to_string(),
        };

        (status, body).into_response()
    }
}

/// Reasons a single multipart part is not accepted as a stored file.
///
/// Only `StorageWriteFailed` fails the whole request; the others drop the part.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("part `{file_name}` has non-image content type {content_type:?}")]
    InvalidContentType {
        file_name: String,
        content_type: Option<String>,
    },
    #[error("part `{file_name}` exceeds the {limit} byte limit")]
    PartTooLarge { file_name: String, limit: usize },
    #[error("file name {0:?} is not a valid single path component")]
    InvalidFileName(String),
    #[error("failed to store `{file_name}`: {source}")]
    StorageWriteFailed {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Whether the request can continue after dropping the offending part.
    pub fn is_part_rejection(&self) -> bool {
        !matches!(self, UploadError::StorageWriteFailed { .. })
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::StorageWriteFailed { .. } => ApiError::Internal,
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("invalid storage type {0:?}, expected `local` or `memory`")]
    InvalidStorageType(String),
    #[error("invalid listen address {0}")]
    InvalidAddr(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
    #[error("unexpected response body: {0}")]
    Decode(String),
}
