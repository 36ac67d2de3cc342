//! `PostgreSQL` credential store (see `sql/schema.sql`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use super::models::{CredentialRecord, NewCredential};
use super::store::{CredentialStore, InsertOutcome, ResetAssignment};

const RECORD_COLUMNS: &str = "id, document, email, username, name, last_name, password_hash, \
     reset_password_token, role";

// Advisory lock key guarding identifier uniqueness across `document` and `username`.
const IDENTIFIER_LOCK_KEY: i64 = 0x7669_6e63_756c_6f;

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<CredentialRecord>> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM users WHERE {column} = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        sqlx::query_as::<_, CredentialRecord>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .with_context(|| format!("failed to lookup credential record by {column}"))
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn ping(&self) -> Result<()> {
        let query = "SELECT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("database ping failed")?;
        Ok(())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>> {
        if let Some(record) = self.fetch_one_by("document", identifier).await? {
            return Ok(Some(record));
        }
        self.fetch_one_by("username", identifier).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM users WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        sqlx::query_as::<_, CredentialRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup credential record by id")
    }

    async fn insert(&self, credential: NewCredential) -> Result<InsertOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin credential insert")?;

        // Serializes inserts so the cross-column check below cannot race.
        let lock = "SELECT pg_advisory_xact_lock($1)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = lock
        );
        sqlx::query(lock)
            .bind(IDENTIFIER_LOCK_KEY)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to lock identifiers")?;

        // Login resolves documents before usernames, so neither may shadow the other.
        let query = format!(
            "INSERT INTO users (document, email, username, name, last_name, password_hash, role) \
             SELECT $1::text, $2::text, $3::text, $4::text, $5::text, $6::text, $7::text \
             WHERE NOT EXISTS (SELECT 1 FROM users WHERE username = $1::text OR document = $3::text) \
             RETURNING {RECORD_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = %query
        );
        let result = sqlx::query_as::<_, CredentialRecord>(&query)
            .bind(&credential.document)
            .bind(&credential.email)
            .bind(credential.username.as_deref())
            .bind(credential.name.as_deref())
            .bind(credential.last_name.as_deref())
            .bind(&credential.password_hash)
            .bind(credential.role.as_str())
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await;

        let outcome = match result {
            Ok(Some(record)) => InsertOutcome::Created(record),
            Ok(None) => InsertOutcome::Conflict,
            Err(err) if is_unique_violation(&err) => InsertOutcome::Conflict,
            Err(err) => return Err(err).context("failed to insert credential record"),
        };

        if matches!(outcome, InsertOutcome::Created(_)) {
            tx.commit()
                .await
                .context("failed to commit credential insert")?;
        }
        Ok(outcome)
    }

    async fn assign_reset_token(&self, email: &str, token: Uuid) -> Result<ResetAssignment> {
        let query = format!(
            "UPDATE users SET reset_password_token = $2, updated_at = NOW() \
             WHERE email = $1 RETURNING {RECORD_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let result = sqlx::query_as::<_, CredentialRecord>(&query)
            .bind(email)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(Some(record)) => Ok(ResetAssignment::Assigned(record)),
            Ok(None) => Ok(ResetAssignment::UnknownEmail),
            Err(err) if is_unique_violation(&err) => Ok(ResetAssignment::TokenCollision),
            Err(err) => Err(err).context("failed to assign reset token"),
        }
    }

    async fn consume_reset_token(&self, token: Uuid, password_hash: &str) -> Result<bool> {
        let query = r"
            UPDATE users
            SET password_hash = $2, reset_password_token = NULL, updated_at = NOW()
            WHERE reset_password_token = $1 AND reset_password_token IS NOT NULL
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(token)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume reset token")?;

        Ok(result.rows_affected() == 1)
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
