use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use passabola_core::PlatformError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Erro devolvido pelos handlers HTTP; o corpo segue `{"detail": ...}`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        let status = match &err {
            PlatformError::Validation(_) => StatusCode::BAD_REQUEST,
            PlatformError::NotFound(_) => StatusCode::NOT_FOUND,
            PlatformError::Auth(_) => StatusCode::UNAUTHORIZED,
            PlatformError::Io(_) | PlatformError::Internal(_) => {
                error!(code = err.code(), %err, "falha interna ao atender requisição");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &err {
            PlatformError::Validation(inner) => inner.to_string(),
            PlatformError::NotFound(message) => message.clone(),
            PlatformError::Auth(inner) => inner.to_string(),
            other => other.to_string(),
        };

        Self::new(status, message)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "detail": self.message }))).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
