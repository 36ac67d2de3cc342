//! Password reset: issue a single-use token, deliver it, exchange it for a new hash.
//!
//! Token lifecycle is `absent -> issued -> absent`. Issuing overwrites any token
//! the record already holds, so only the latest request is redeemable. Redeeming
//! is a conditional update in the store; two concurrent confirmations with the
//! same token cannot both succeed.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::error::{AuthError, Lookup, Result};
use super::password::PasswordHasher;
use super::store::{CredentialStore, ResetAssignment};
use super::token::TokenIssuer;
use crate::email::{EmailSender, EmailTemplates};

const MAX_TOKEN_ATTEMPTS: usize = 3;

pub struct ResetCoordinator {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    email: Arc<dyn EmailSender>,
    templates: EmailTemplates,
    frontend_base_url: String,
}

impl ResetCoordinator {
    /// # Errors
    /// Returns an error if the email templates fail to compile.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        email: Arc<dyn EmailSender>,
        frontend_base_url: String,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            hasher,
            email,
            templates: EmailTemplates::new()?,
            frontend_base_url,
        })
    }

    /// Issue a fresh reset token for `email` and send the reset link.
    ///
    /// The token stays persisted when delivery fails.
    ///
    /// # Errors
    /// `NotFound` for an unknown email, `NotificationFailure` when the email
    /// could not be sent, `Internal` on store or rendering failures.
    #[instrument(skip(self))]
    pub async fn request_reset(&self, email: &str) -> Result<()> {
        let mut assigned = None;
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = TokenIssuer::issue_reset_token();
            match self.store.assign_reset_token(email, token).await? {
                ResetAssignment::Assigned(record) => {
                    assigned = Some((record, token));
                    break;
                }
                ResetAssignment::UnknownEmail => {
                    info!("reset request rejected: unknown email");
                    return Err(AuthError::NotFound(Lookup::Email));
                }
                ResetAssignment::TokenCollision => {
                    warn!("reset token collision, retrying with a new token");
                }
            }
        }

        let Some((record, token)) = assigned else {
            return Err(AuthError::Internal(anyhow::anyhow!(
                "failed to assign a unique reset token after {MAX_TOKEN_ATTEMPTS} attempts"
            )));
        };

        let url = build_reset_url(&self.frontend_base_url, &token);
        let message = self
            .templates
            .reset_password_message(&record, &url)
            .map_err(AuthError::Internal)?;
        if let Err(err) = self.email.send(&message).await {
            error!(user_id = record.id, "failed to send reset email: {err:#}");
            return Err(AuthError::NotificationFailure(err));
        }

        info!(user_id = record.id, "reset email sent");
        Ok(())
    }

    /// Replace the password of the record holding `token` and clear the token.
    ///
    /// # Errors
    /// `NotFound` when no record holds the token (unknown or already used),
    /// `Internal` on hashing or store failures.
    #[instrument(skip_all)]
    pub async fn confirm_reset(&self, token: Uuid, new_plaintext: &str) -> Result<()> {
        let password_hash = self.hasher.hash(new_plaintext).await?;

        if !self
            .store
            .consume_reset_token(token, &password_hash)
            .await?
        {
            info!("reset confirmation rejected: token unknown or already used");
            return Err(AuthError::NotFound(Lookup::ResetToken));
        }

        info!("password reset completed");
        Ok(())
    }
}

impl std::fmt::Debug for ResetCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetCoordinator")
            .field("hasher", &self.hasher)
            .field("frontend_base_url", &self.frontend_base_url)
            .finish_non_exhaustive()
    }
}

/// Frontend link carrying the reset token in the fragment, so it never reaches server logs.
#[must_use]
pub fn build_reset_url(frontend_base_url: &str, token: &Uuid) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/reset-password#token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::authenticator::Authenticator;
    use crate::credentials::memory::MemoryCredentialStore;
    use crate::credentials::models::{CredentialRecord, NewCredential, Role};
    use crate::credentials::store::InsertOutcome;
    use crate::email::EmailMessage;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    struct FailingSender;

    #[async_trait]
    impl EmailSender for FailingSender {
        async fn send(&self, _message: &EmailMessage) -> anyhow::Result<()> {
            anyhow::bail!("smtp relay unreachable")
        }
    }

    struct Fixture {
        store: Arc<MemoryCredentialStore>,
        hasher: PasswordHasher,
        record: CredentialRecord,
    }

    async fn fixture() -> anyhow::Result<Fixture> {
        let store = Arc::new(MemoryCredentialStore::new());
        let hasher = PasswordHasher::new(4)?;
        let outcome = store
            .insert(NewCredential {
                document: "123".to_string(),
                email: "a@b.com".to_string(),
                username: None,
                name: Some("Ana".to_string()),
                last_name: None,
                password_hash: hasher.hash("secret").await?,
                role: Role::Staff,
            })
            .await?;
        let InsertOutcome::Created(record) = outcome else {
            anyhow::bail!("fixture insert conflicted");
        };
        Ok(Fixture {
            store,
            hasher,
            record,
        })
    }

    fn coordinator(
        fixture: &Fixture,
        email: Arc<dyn EmailSender>,
    ) -> anyhow::Result<ResetCoordinator> {
        ResetCoordinator::new(
            fixture.store.clone(),
            fixture.hasher,
            email,
            "https://vinculo.dev/".to_string(),
        )
    }

    async fn stored_token(fixture: &Fixture) -> anyhow::Result<Uuid> {
        fixture
            .store
            .snapshot(fixture.record.id)
            .await
            .and_then(|r| r.reset_token)
            .ok_or_else(|| anyhow::anyhow!("no reset token stored"))
    }

    #[test]
    fn build_reset_url_trims_trailing_slash() {
        let token = Uuid::nil();
        assert_eq!(
            build_reset_url("https://vinculo.dev/", &token),
            "https://vinculo.dev/reset-password#token=00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn request_stores_token_and_emails_link() -> anyhow::Result<()> {
        let fixture = fixture().await?;
        let sender = Arc::new(RecordingSender::default());
        coordinator(&fixture, sender.clone())?
            .request_reset("a@b.com")
            .await?;

        let token = stored_token(&fixture).await?;
        assert_eq!(token.get_version_num(), 4);

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "a@b.com");
        assert!(sent[0]
            .html_body
            .contains(&format!("https://vinculo.dev/reset-password#token={token}")));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() -> anyhow::Result<()> {
        let fixture = fixture().await?;
        let sender = Arc::new(RecordingSender::default());
        let result = coordinator(&fixture, sender.clone())?
            .request_reset("nobody@b.com")
            .await;
        assert!(matches!(result, Err(AuthError::NotFound(Lookup::Email))));
        assert!(sender.sent.lock().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_delivery_keeps_token_persisted() -> anyhow::Result<()> {
        let fixture = fixture().await?;
        let result = coordinator(&fixture, Arc::new(FailingSender))?
            .request_reset("a@b.com")
            .await;
        assert!(matches!(result, Err(AuthError::NotificationFailure(_))));
        assert!(stored_token(&fixture).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn second_request_invalidates_first_token() -> anyhow::Result<()> {
        let fixture = fixture().await?;
        let coordinator = coordinator(&fixture, Arc::new(RecordingSender::default()))?;

        coordinator.request_reset("a@b.com").await?;
        let first = stored_token(&fixture).await?;
        coordinator.request_reset("a@b.com").await?;
        let second = stored_token(&fixture).await?;
        assert_ne!(first, second);

        let result = coordinator.confirm_reset(first, "newpass1").await;
        assert!(matches!(result, Err(AuthError::NotFound(Lookup::ResetToken))));
        coordinator.confirm_reset(second, "newpass1").await?;
        Ok(())
    }

    #[tokio::test]
    async fn full_reset_scenario() -> anyhow::Result<()> {
        let fixture = fixture().await?;
        let tokens = Arc::new(TokenIssuer::new(
            &SecretString::from("server-secret".to_string()),
            Duration::from_secs(3600),
        )?);
        let authenticator =
            Authenticator::new(fixture.store.clone(), fixture.hasher, tokens.clone());
        let coordinator = coordinator(&fixture, Arc::new(RecordingSender::default()))?;

        let outcome = authenticator.login("123", "secret").await?;
        let claims = tokens.verify(&outcome.access_token)?;
        assert_eq!((claims.sub, claims.identifier.as_str()), (1, "123"));
        assert!(matches!(
            authenticator.login("123", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));

        coordinator.request_reset("a@b.com").await?;
        let token = stored_token(&fixture).await?;

        coordinator.confirm_reset(token, "newpass1").await?;
        let stored = fixture
            .store
            .snapshot(fixture.record.id)
            .await
            .ok_or_else(|| anyhow::anyhow!("record vanished"))?;
        assert!(stored.reset_token.is_none());
        assert!(fixture.hasher.verify("newpass1", &stored.password_hash).await?);

        assert!(matches!(
            coordinator.confirm_reset(token, "anything").await,
            Err(AuthError::NotFound(Lookup::ResetToken))
        ));

        authenticator.login("123", "newpass1").await?;
        assert!(matches!(
            authenticator.login("123", "secret").await,
            Err(AuthError::InvalidCredentials)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_confirmations_succeed_once() -> anyhow::Result<()> {
        let fixture = fixture().await?;
        let coordinator = Arc::new(coordinator(
            &fixture,
            Arc::new(RecordingSender::default()),
        )?);
        coordinator.request_reset("a@b.com").await?;
        let token = stored_token(&fixture).await?;

        let mut handles = Vec::new();
        for i in 0..8 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator.confirm_reset(token, &format!("newpass{i}")).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await? {
                Ok(()) => succeeded += 1,
                Err(AuthError::NotFound(Lookup::ResetToken)) => {}
                Err(err) => return Err(anyhow::anyhow!("unexpected error: {err}")),
            }
        }
        assert_eq!(succeeded, 1);
        Ok(())
    }
}
