//! User creation and lookup.
//!
//! Creating a user is public (it is how the first credentials get in); reading
//! one needs a session token, and the gate hands the verified claims over.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

use super::auth::{
    responses::{error_response, ErrorBody},
    AuthState,
};
use super::{normalize_email, valid_email, valid_password};
use crate::credentials::{Claims, InsertOutcome, NewCredential, Role, UserProjection};

#[derive(ToSchema, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub document: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("document", &self.document)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("username", &self.username)
            .field("password", &"***")
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateUserResponse {
    pub user: UserProjection,
    pub message: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Document, email or username already registered", body = ErrorBody)
    ),
    tag = "users"
)]
#[instrument(skip(auth_state, payload))]
pub async fn create_user(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateUserRequest>>,
) -> impl IntoResponse {
    let request: CreateUserRequest = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    let document = request.document.trim().to_string();
    if document.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing document");
    }
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email");
    }
    if !valid_password(&request.password) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Password must be 6 to 20 characters and at most 72 bytes",
        );
    }

    let password_hash = match auth_state.hasher().hash(&request.password).await {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err:#}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user");
        }
    };

    let credential = NewCredential {
        document,
        email,
        username: non_empty(request.username),
        name: non_empty(request.name),
        last_name: non_empty(request.last_name),
        password_hash,
        role: request.role,
    };

    match auth_state.store().insert(credential).await {
        Ok(InsertOutcome::Created(record)) => {
            info!(user_id = record.id, role = %record.role, "user created");
            (
                StatusCode::CREATED,
                Json(CreateUserResponse {
                    user: record.projection(),
                    message: "User created".to_string(),
                }),
            )
                .into_response()
        }
        Ok(InsertOutcome::Conflict) => error_response(StatusCode::CONFLICT, "User already exists"),
        Err(err) => {
            error!("Failed to insert user: {err:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
        }
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = UserProjection),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(user_id = id))]
pub async fn get_user(
    Path(id): Path<i64>,
    auth_state: Extension<Arc<AuthState>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    debug!(requested_by = claims.sub, "user lookup");
    match auth_state.store().find_by_id(id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record.projection())).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to lookup user: {err:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to lookup user")
        }
    }
}
