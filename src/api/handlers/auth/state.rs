//! Auth configuration and the services built from it at startup.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::{
    Authenticator, CredentialStore, PasswordHasher, ResetCoordinator, TokenIssuer,
};
use crate::email::EmailSender;

const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60;
const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    frontend_base_url: String,
    session_ttl_seconds: u64,
    bcrypt_cost: u32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            jwt_secret,
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

/// Shared services for the auth and user handlers.
pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
    authenticator: Authenticator,
    reset: ResetCoordinator,
}

impl AuthState {
    /// Wire the credential services.
    ///
    /// # Errors
    /// Returns an error if the signing secret is empty, the session lifetime is
    /// zero or the bcrypt cost is out of range.
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
        email: Arc<dyn EmailSender>,
    ) -> Result<Self> {
        let tokens = Arc::new(
            TokenIssuer::new(
                &config.jwt_secret,
                Duration::from_secs(config.session_ttl_seconds),
            )
            .context("invalid session token settings")?,
        );
        let hasher =
            PasswordHasher::new(config.bcrypt_cost).context("invalid password hashing settings")?;

        let authenticator = Authenticator::new(store.clone(), hasher, tokens.clone());
        let reset = ResetCoordinator::new(
            store.clone(),
            hasher,
            email,
            config.frontend_base_url.clone(),
        )
        .context("failed to load email templates")?;

        Ok(Self {
            config,
            store,
            hasher,
            tokens,
            authenticator,
            reset,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub(crate) fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    #[must_use]
    pub fn tokens(&self) -> Arc<TokenIssuer> {
        self.tokens.clone()
    }

    pub(crate) fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub(crate) fn reset(&self) -> &ResetCoordinator {
        &self.reset
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator)
            .field("reset", &self.reset)
            .finish_non_exhaustive()
    }
}
