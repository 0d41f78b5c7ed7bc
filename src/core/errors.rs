use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No files uploaded")]
    EmptyBatch,
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("No results could be extracted from the uploaded files")]
    NoResults,
    #[error("No results available for session {0}")]
    ResultsNotFound(String),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::EmptyBatch
            | CoreError::UnsupportedFormat(_)
            | CoreError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CoreError::NoResults => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::ResultsNotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CoreError::EmptyBatch => "EMPTY_BATCH",
            CoreError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            CoreError::InvalidRequest(_) => "INVALID_REQUEST",
            CoreError::NoResults => "NO_RESULTS",
            CoreError::ResultsNotFound(_) => "NOT_FOUND",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let message = match &self {
            CoreError::Internal(err) => {
                tracing::error!("Internal error: {err:?}");
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (self.status_code(), body).into_response()
    }
}
