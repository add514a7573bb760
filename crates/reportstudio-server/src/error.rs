//! API error type and its HTTP mapping.
//!
//! The caller always receives `{"error": "..."}`; provider failures are
//! typed by upstream status (408/401/403/429/502/503), everything else is
//! a 400 for bad input or a 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::llm::LlmError;
use reportstudio_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// The provider answered, but the content failed validation (e.g. no
    /// Mermaid diagram detected).
    #[error("{0}")]
    InvalidContent(String),

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("document rendering failed: {0}")]
    Render(#[from] EngineError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
        }

        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Provider(err) => match err {
                LlmError::Timeout => StatusCode::REQUEST_TIMEOUT,
                LlmError::InvalidCredentials | LlmError::MissingApiKey(_) => {
                    StatusCode::UNAUTHORIZED
                }
                LlmError::Forbidden => StatusCode::FORBIDDEN,
                LlmError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                LlmError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
                LlmError::NotConfigured(_) => StatusCode::BAD_REQUEST,
                LlmError::Unavailable(_) | LlmError::Upstream(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
