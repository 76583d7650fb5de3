use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use neonflow_telegram::TelegramError;

/// Request-level failure taxonomy. Validation and authorization failures
/// short-circuit before any external call or write; authority failures abort
/// the operation with nothing persisted.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    /// The messaging authority failed or rejected the call; its description
    /// is surfaced to the caller.
    #[error("{0}")]
    Authority(String),
    /// Storage or other unexpected failure. Detail goes to the log only.
    #[error("Server error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<TelegramError> for ApiError {
    fn from(err: TelegramError) -> Self {
        ApiError::Authority(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Authority(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let ApiError::Internal(err) = &self {
            error!("request failed: {:#}", err);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_detail() {
        let err = ApiError::from(anyhow::anyhow!("connection pool exhausted"));
        assert_eq!(err.to_string(), "Server error");
    }

    #[test]
    fn authority_errors_carry_the_description() {
        let err = ApiError::from(TelegramError::Api("chat not found".into()));
        assert_eq!(err.to_string(), "chat not found");
    }
}
