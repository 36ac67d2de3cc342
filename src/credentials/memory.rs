//! In-process credential store.
//!
//! Each operation runs inside one critical section, which gives it the same
//! atomicity the `PostgreSQL` store gets from single statements. Used by tests
//! and local runs without a database.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{CredentialRecord, NewCredential};
use super::store::{CredentialStore, InsertOutcome, ResetAssignment};

#[derive(Default)]
struct Inner {
    records: BTreeMap<i64, CredentialRecord>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Inner>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored record, for assertions.
    pub async fn snapshot(&self, id: i64) -> Option<CredentialRecord> {
        self.inner.lock().await.records.get(&id).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>> {
        let inner = self.inner.lock().await;
        let found = inner
            .records
            .values()
            .find(|r| r.document == identifier)
            .or_else(|| {
                inner
                    .records
                    .values()
                    .find(|r| r.username.as_deref() == Some(identifier))
            })
            .cloned();
        Ok(found)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>> {
        Ok(self.inner.lock().await.records.get(&id).cloned())
    }

    async fn insert(&self, credential: NewCredential) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock().await;
        let conflict = inner.records.values().any(|r| {
            r.document == credential.document
                || r.email == credential.email
                || r.username.as_deref() == Some(credential.document.as_str())
                || credential.username.as_ref().is_some_and(|username| {
                    r.username.as_ref() == Some(username) || &r.document == username
                })
        });
        if conflict {
            return Ok(InsertOutcome::Conflict);
        }

        inner.next_id += 1;
        let record = CredentialRecord {
            id: inner.next_id,
            document: credential.document,
            email: credential.email,
            username: credential.username,
            name: credential.name,
            last_name: credential.last_name,
            password_hash: credential.password_hash,
            reset_token: None,
            role: credential.role,
        };
        inner.records.insert(record.id, record.clone());
        Ok(InsertOutcome::Created(record))
    }

    async fn assign_reset_token(&self, email: &str, token: Uuid) -> Result<ResetAssignment> {
        let mut inner = self.inner.lock().await;
        let Some(id) = inner
            .records
            .values()
            .find(|r| r.email == email)
            .map(|r| r.id)
        else {
            return Ok(ResetAssignment::UnknownEmail);
        };

        if inner
            .records
            .values()
            .any(|r| r.id != id && r.reset_token == Some(token))
        {
            return Ok(ResetAssignment::TokenCollision);
        }

        match inner.records.get_mut(&id) {
            Some(record) => {
                record.reset_token = Some(token);
                Ok(ResetAssignment::Assigned(record.clone()))
            }
            None => Ok(ResetAssignment::UnknownEmail),
        }
    }

    async fn consume_reset_token(&self, token: Uuid, password_hash: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner
            .records
            .values_mut()
            .find(|r| r.reset_token == Some(token))
        {
            Some(record) => {
                record.password_hash = password_hash.to_string();
                record.reset_token = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::models::Role;

    fn credential(document: &str, email: &str) -> NewCredential {
        NewCredential {
            document: document.to_string(),
            email: email.to_string(),
            username: None,
            name: None,
            last_name: None,
            password_hash: "hash".to_string(),
            role: Role::Staff,
        }
    }

    async fn created(store: &MemoryCredentialStore, new: NewCredential) -> Result<CredentialRecord> {
        match store.insert(new).await? {
            InsertOutcome::Created(record) => Ok(record),
            InsertOutcome::Conflict => Err(anyhow::anyhow!("unexpected conflict")),
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_detects_conflicts() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let first = created(&store, credential("1", "a@b.com")).await?;
        let second = created(&store, credential("2", "c@d.com")).await?;
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        assert!(matches!(
            store.insert(credential("1", "x@y.com")).await?,
            InsertOutcome::Conflict
        ));
        assert!(matches!(
            store.insert(credential("3", "a@b.com")).await?,
            InsertOutcome::Conflict
        ));
        Ok(())
    }

    #[tokio::test]
    async fn identifier_matches_document_then_username() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let mut new = credential("123", "a@b.com");
        new.username = Some("ana".to_string());
        let record = created(&store, new).await?;

        assert_eq!(store.find_by_identifier("123").await?.map(|r| r.id), Some(record.id));
        assert_eq!(store.find_by_identifier("ana").await?.map(|r| r.id), Some(record.id));
        assert!(store.find_by_identifier("nobody").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn usernames_and_documents_cannot_shadow_each_other() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let mut first = credential("123", "a@b.com");
        first.username = Some("ana".to_string());
        created(&store, first).await?;

        let mut username_is_document = credential("456", "c@d.com");
        username_is_document.username = Some("123".to_string());
        assert!(matches!(
            store.insert(username_is_document).await?,
            InsertOutcome::Conflict
        ));

        assert!(matches!(
            store.insert(credential("ana", "e@f.com")).await?,
            InsertOutcome::Conflict
        ));

        let mut distinct = credential("456", "c@d.com");
        distinct.username = Some("bea".to_string());
        let record = created(&store, distinct).await?;
        assert_eq!(store.find_by_identifier("bea").await?.map(|r| r.id), Some(record.id));
        Ok(())
    }

    #[tokio::test]
    async fn assign_overwrites_previous_token() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let record = created(&store, credential("1", "a@b.com")).await?;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.assign_reset_token("a@b.com", first).await?;
        store.assign_reset_token("a@b.com", second).await?;

        assert_eq!(
            store.snapshot(record.id).await.and_then(|r| r.reset_token),
            Some(second)
        );
        assert!(!store.consume_reset_token(first, "new").await?);
        Ok(())
    }

    #[tokio::test]
    async fn assign_reports_unknown_email_and_collisions() -> Result<()> {
        let store = MemoryCredentialStore::new();
        created(&store, credential("1", "a@b.com")).await?;
        created(&store, credential("2", "c@d.com")).await?;
        let token = Uuid::new_v4();

        assert!(matches!(
            store.assign_reset_token("z@z.com", token).await?,
            ResetAssignment::UnknownEmail
        ));
        assert!(matches!(
            store.assign_reset_token("a@b.com", token).await?,
            ResetAssignment::Assigned(_)
        ));
        assert!(matches!(
            store.assign_reset_token("c@d.com", token).await?,
            ResetAssignment::TokenCollision
        ));
        Ok(())
    }

    #[tokio::test]
    async fn consume_is_single_use() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let record = created(&store, credential("1", "a@b.com")).await?;
        let token = Uuid::new_v4();
        store.assign_reset_token("a@b.com", token).await?;

        assert!(store.consume_reset_token(token, "new-hash").await?);
        assert!(!store.consume_reset_token(token, "other-hash").await?);

        let stored = store.snapshot(record.id).await;
        assert_eq!(stored.as_ref().map(|r| r.password_hash.as_str()), Some("new-hash"));
        assert_eq!(stored.and_then(|r| r.reset_token), None);
        Ok(())
    }
}
