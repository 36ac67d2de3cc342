//! Request/response types for auth endpoints.
//!
//! Requests carrying passwords or tokens implement `Debug` by hand so they can
//! be logged without leaking secrets.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::credentials::UserProjection;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Document number or username.
    #[serde(alias = "document")]
    pub identifier: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProjection,
    pub access_token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .field("access_token", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// UUID v4 received in the reset email.
    pub reset_password_token: String,
    /// New password, 6 to 20 characters.
    pub password: String,
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("reset_password_token", &"***")
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use serde_json::json;

    #[test]
    fn login_request_accepts_document_alias() -> Result<()> {
        let request: LoginRequest =
            serde_json::from_value(json!({"document": "123", "password": "secret"}))?;
        assert_eq!(request.identifier, "123");

        let request: LoginRequest =
            serde_json::from_value(json!({"identifier": "ana", "password": "secret"}))?;
        assert_eq!(request.identifier, "ana");
        Ok(())
    }

    #[test]
    fn reset_password_request_uses_camel_case() -> Result<()> {
        let token = "0b1e7c1c-9a59-4a53-8c47-3f0d2f8d7f51";
        let request: ResetPasswordRequest = serde_json::from_value(
            json!({"resetPasswordToken": token, "password": "newpass1"}),
        )?;
        assert_eq!(request.reset_password_token, token);

        let value = serde_json::to_value(&request)?;
        let round_tripped = value
            .get("resetPasswordToken")
            .and_then(serde_json::Value::as_str)
            .context("missing resetPasswordToken")?;
        assert_eq!(round_tripped, token);
        Ok(())
    }

    #[test]
    fn debug_output_hides_secrets() {
        let login = LoginRequest {
            identifier: "123".to_string(),
            password: "hunter22".to_string(),
        };
        let reset = ResetPasswordRequest {
            reset_password_token: "0b1e7c1c-9a59-4a53-8c47-3f0d2f8d7f51".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{login:?}").contains("hunter22"));
        assert!(!format!("{reset:?}").contains("hunter22"));
        assert!(!format!("{reset:?}").contains("0b1e7c1c"));
    }
}
