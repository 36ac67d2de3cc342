//! Password login: lookup, hash verification, session token issuance.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use super::error::{AuthError, Lookup, Result};
use super::models::UserProjection;
use super::password::PasswordHasher;
use super::store::CredentialStore;
use super::token::TokenIssuer;

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserProjection,
    pub access_token: String,
}

// Hashed once per authenticator so unknown identifiers cost one bcrypt verify.
const DECOY_PASSWORD: &str = "vinculo-decoy-password";

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
    decoy_hash: OnceCell<String>,
}

impl Authenticator {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Run a verify at the configured cost against a digest no password matches,
    /// so unknown identifiers take as long as wrong passwords.
    async fn verify_decoy(&self, plaintext: &str) -> Result<()> {
        let digest = self
            .decoy_hash
            .get_or_try_init(|| self.hasher.hash(DECOY_PASSWORD))
            .await?;
        self.hasher.verify(plaintext, digest).await?;
        Ok(())
    }

    /// Verify `plaintext` for the record behind `identifier` and sign a session token.
    ///
    /// # Errors
    /// `NotFound` for an unknown identifier, `InvalidCredentials` on a password
    /// mismatch, `Internal` when the store, hasher or signer fails.
    #[instrument(skip(self, plaintext))]
    pub async fn login(&self, identifier: &str, plaintext: &str) -> Result<LoginOutcome> {
        let Some(record) = self.store.find_by_identifier(identifier).await? else {
            self.verify_decoy(plaintext).await?;
            info!("login rejected: unknown identifier");
            return Err(AuthError::NotFound(Lookup::Identifier));
        };

        if !self.hasher.verify(plaintext, &record.password_hash).await? {
            warn!(user_id = record.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_session(record.id, &record.document)?;
        info!(user_id = record.id, "login succeeded");

        Ok(LoginOutcome {
            user: record.projection(),
            access_token,
        })
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
