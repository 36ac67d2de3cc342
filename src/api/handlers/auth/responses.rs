//! Error bodies and the mapping from `AuthError` to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::credentials::AuthError;

/// JSON error body returned by every endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            status_code: status.as_u16(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Unknown identifiers and wrong passwords look the same to the caller.
pub(super) fn login_error_response(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::NotFound(_) | AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials")
        }
        AuthError::NotificationFailure(source) | AuthError::Internal(source) => {
            error!("login failed: {source:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        }
    }
}

pub(super) fn request_reset_error_response(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::NotFound(_) => (StatusCode::NOT_FOUND, "Email not found"),
        AuthError::NotificationFailure(_) => {
            (StatusCode::BAD_GATEWAY, "Failed to send reset email")
        }
        AuthError::InvalidCredentials => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to request password reset")
        }
        AuthError::Internal(source) => {
            error!("reset request failed: {source:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to request password reset")
        }
    }
}

pub(super) fn reset_password_error_response(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::NotFound(_) => (StatusCode::NOT_FOUND, "Invalid or expired reset token"),
        AuthError::InvalidCredentials | AuthError::NotificationFailure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to reset password")
        }
        AuthError::Internal(source) => {
            error!("password reset failed: {source:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to reset password")
        }
    }
}
