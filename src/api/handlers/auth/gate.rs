//! Bearer token middleware in front of every protected route.
//!
//! Requests matching [`PUBLIC_ROUTES`] pass through untouched. Everything else
//! needs `Authorization: Bearer <token>` with a valid signature and an unexpired
//! `exp`; the verified [`Claims`] are inserted into the request extensions.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use super::responses::error_response;
use crate::credentials::{Claims, TokenIssuer};

/// Routes reachable without a session token.
pub const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("POST", "/auth/login"),
    ("POST", "/auth/request-reset-password"),
    ("PATCH", "/auth/reset-password"),
    ("POST", "/users"),
    ("GET", "/health"),
    ("HEAD", "/health"),
    ("GET", "/api-docs/openapi.json"),
];

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BearerError {
    MissingHeader,
    MissingToken,
    Invalid,
}

pub(crate) fn is_public(method: &Method, path: &str) -> bool {
    PUBLIC_ROUTES
        .iter()
        .any(|(public_method, public_path)| {
            *public_method == method.as_str() && *public_path == path
        })
}

pub(crate) fn extract_bearer(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(BearerError::MissingHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(BearerError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(BearerError::MissingToken);
    }
    Ok(token)
}

pub(crate) fn bearer_error_response(err: &BearerError) -> (StatusCode, &'static str) {
    match err {
        BearerError::MissingHeader => (StatusCode::UNAUTHORIZED, "Missing authorization header"),
        BearerError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing bearer token"),
        BearerError::Invalid => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
    }
}

fn verify_request(tokens: &TokenIssuer, headers: &HeaderMap) -> Result<Claims, BearerError> {
    let token = extract_bearer(headers)?;
    tokens.verify(token).map_err(|err| {
        debug!("rejected bearer token: {err}");
        BearerError::Invalid
    })
}

pub async fn access_gate(
    State(tokens): State<Arc<TokenIssuer>>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    match verify_request(&tokens, request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            let (status, message) = bearer_error_response(&err);
            error_response(status, message)
        }
    }
}
