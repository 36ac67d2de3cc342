use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Closed set of roles a user can hold. Resolved once when the record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Coordinator,
    Staff,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Coordinator => "coordinator",
            Self::Staff => "staff",
        }
    }

    /// Parse the persisted `users.role` value.
    ///
    /// # Errors
    /// Returns `sqlx::Error::Decode` for values outside the closed set.
    pub fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "coordinator" => Ok(Self::Coordinator),
            "staff" => Ok(Self::Staff),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid users.role value: {value}"),
            )))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted identity, password hash and reset state for one user.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: i64,
    pub document: String,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub reset_token: Option<Uuid>,
    pub role: Role,
}

impl CredentialRecord {
    /// Public view of the record; never carries the hash or the reset token.
    #[must_use]
    pub fn projection(&self) -> UserProjection {
        UserProjection {
            id: self.id,
            document: self.document.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("document", &self.document)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("password_hash", &"***")
            .field("reset_token", &self.reset_token.map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl<'r> FromRow<'r, PgRow> for CredentialRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            document: row.try_get("document")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            name: row.try_get("name")?,
            last_name: row.try_get("last_name")?,
            password_hash: row.try_get("password_hash")?,
            reset_token: row.try_get("reset_password_token")?,
            role: Role::from_db(&role)?,
        })
    }
}

/// Input for creating a credential record. The password is already hashed.
#[derive(Clone)]
pub struct NewCredential {
    pub document: String,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// What callers outside the store get to see about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProjection {
    pub id: i64,
    pub document: String,
    pub name: Option<String>,
    pub role: Role,
}
