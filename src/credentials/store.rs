//! Persistence contract for credential records.
//!
//! Every mutating operation is a single atomic step in the backing store. The
//! services above never read a record and then write it back; they ask the
//! store to do the check and the write together and report what happened.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::models::{CredentialRecord, NewCredential};

/// Outcome when attempting to create a new credential record.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(CredentialRecord),
    /// Document, email or username already taken.
    Conflict,
}

/// Outcome when overwriting the reset token for an email.
#[derive(Debug)]
pub enum ResetAssignment {
    Assigned(CredentialRecord),
    UnknownEmail,
    /// The generated token is already held by another record.
    TokenCollision,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Cheap liveness check for health reporting.
    async fn ping(&self) -> Result<()>;

    /// Look up a record by its human-facing identifier (document or username).
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>>;

    async fn insert(&self, credential: NewCredential) -> Result<InsertOutcome>;

    /// Overwrite the reset token of the record owning `email`.
    ///
    /// Lookup and overwrite happen in one step, so concurrent requests for the
    /// same account resolve to whichever write lands last.
    async fn assign_reset_token(&self, email: &str, token: Uuid) -> Result<ResetAssignment>;

    /// Replace the password hash and clear the reset token, only if `token` is
    /// still the one stored. Returns `false` when no record holds it.
    async fn consume_reset_token(&self, token: Uuid, password_hash: &str) -> Result<bool>;
}
