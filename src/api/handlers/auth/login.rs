//! `POST /auth/login`.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    responses::{error_response, login_error_response, ErrorBody},
    state::AuthState,
    types::{LoginRequest, LoginResponse},
};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Login failed", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    let identifier = request.identifier.trim();
    if identifier.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing identifier");
    }
    if request.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing password");
    }

    match auth_state
        .authenticator()
        .login(identifier, &request.password)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(LoginResponse {
                user: outcome.user,
                access_token: outcome.access_token,
            }),
        )
            .into_response(),
        Err(err) => {
            let (status, message) = login_error_response(&err);
            error_response(status, message)
        }
    }
}
