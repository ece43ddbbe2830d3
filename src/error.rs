use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::services::AuthError;

/// Error type of the HTTP handlers. Renders as `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Rejected request input, checked before the auth service runs.
    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

// The rejection text can quote field values, so it stays out of the response.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(status = %rejection.status(), "rejected request body");
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::validation("expected a JSON request body")
            }
            _ => AppError::validation("invalid request body"),
        }
    }
}

fn internal(err: &anyhow::Error) -> (StatusCode, &'static str, String) {
    let detail = format!("{err:#}");
    tracing::error!(error = %detail, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Auth(AuthError::Internal(err)) | AppError::Internal(err) => internal(err),
            AppError::Auth(err @ AuthError::EmailExists) => {
                (StatusCode::CONFLICT, err.code(), err.to_string())
            }
            AppError::Auth(err @ AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, err.code(), err.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
