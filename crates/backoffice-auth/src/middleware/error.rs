//! Error response handling for authentication middleware.
//!
//! Every `AuthError` becomes a JSON body of the form
//! `{"error": "<code>", "message": "<text>"}`. Insufficient-role rejections
//! also carry the `required` and `actual` roles.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_code(&self);

        if status.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "Auth request failed");
        }

        let body = match &self {
            AuthError::InsufficientRole { actual, required } => json!({
                "error": self.code(),
                "message": self.to_string(),
                "required": required,
                "actual": actual,
            }),
            // Server-side details stay in the logs.
            _ if status.is_server_error() => json!({
                "error": self.code(),
                "message": "Internal server error",
            }),
            _ => json!({
                "error": self.code(),
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// HTTP status for an auth error.
#[must_use]
pub fn status_code(error: &AuthError) -> StatusCode {
    match error {
        AuthError::AuthenticationRequired | AuthError::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
        AuthError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        AuthError::NotFound { .. } => StatusCode::NOT_FOUND,
        AuthError::Storage { .. } | AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
