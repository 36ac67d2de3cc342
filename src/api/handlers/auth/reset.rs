//! `POST /auth/request-reset-password` and `PATCH /auth/reset-password`.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    responses::{
        error_response, request_reset_error_response, reset_password_error_response, ErrorBody,
    },
    state::AuthState,
    types::{MessageResponse, RequestResetRequest, ResetPasswordRequest},
};
use crate::api::handlers::{normalize_email, parse_reset_token, valid_email, valid_password};

#[utoipa::path(
    post,
    path = "/auth/request-reset-password",
    request_body = RequestResetRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Email not found", body = ErrorBody),
        (status = 502, description = "Reset email could not be delivered", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn request_reset_password(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RequestResetRequest>>,
) -> impl IntoResponse {
    let request: RequestResetRequest = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email");
    }

    match auth_state.reset().request_reset(&email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password reset email sent")),
        )
            .into_response(),
        Err(err) => {
            let (status, message) = request_reset_error_response(&err);
            error_response(status, message)
        }
    }
}

#[utoipa::path(
    patch,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Reset token unknown or already used", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn reset_password(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    let Some(token) = parse_reset_token(&request.reset_password_token) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid reset token");
    };
    if !valid_password(&request.password) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Password must be 6 to 20 characters and at most 72 bytes",
        );
    }

    match auth_state
        .reset()
        .confirm_reset(token, &request.password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password updated")),
        )
            .into_response(),
        Err(err) => {
            let (status, message) = reset_password_error_response(&err);
            error_response(status, message)
        }
    }
}
