//! Session token signing/verification and reset token generation.

use anyhow::{anyhow, Context, Result};
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Credential record id.
    pub sub: i64,
    /// Human-facing identifier (document number).
    pub identifier: String,
    pub iat: u64,
    pub exp: u64,
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer for HS256 tokens signed with `secret`.
    ///
    /// # Errors
    /// Returns an error if the secret is empty or the lifetime is zero.
    pub fn new(secret: &SecretString, ttl: Duration) -> Result<Self> {
        let secret = secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(anyhow!("session signing secret must not be empty"));
        }
        if ttl.is_zero() {
            return Err(anyhow!("session token lifetime must be greater than zero"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Sign a session token for the given record.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_session(&self, subject: i64, identifier: &str) -> Result<String> {
        let iat = get_current_timestamp();
        let claims = Claims {
            sub: subject,
            identifier: identifier.to_string(),
            iat,
            exp: iat.saturating_add(self.ttl.as_secs()),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .context("failed to sign session token")
    }

    /// Check signature, algorithm and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns the `jsonwebtoken` error describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    /// Fresh single-use reset token. Random v4 UUID, nothing derived from user or time.
    #[must_use]
    pub fn issue_reset_token() -> Uuid {
        Uuid::new_v4()
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &"HS256")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
