use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pros_core::{SchemaError, StorageError};
use serde_json::json;
use thiserror::Error;

/// Errors returned by the read endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("{model} {uid} not found")]
    RecordNotFound { model: String, uid: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownModel(_) | ApiError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
