use std::fmt;
use thiserror::Error;

/// Which key a failed lookup was made with. Kept for logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Identifier,
    Email,
    ResetToken,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Identifier => "identifier",
            Self::Email => "email",
            Self::ResetToken => "reset token",
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential record matches the {0}")]
    NotFound(Lookup),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("failed to deliver notification")]
    NotificationFailure(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
