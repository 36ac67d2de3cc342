//! `PgCredentialStore` against a live `PostgreSQL`.
//!
//! Set `VINCULO_TEST_DSN` (e.g. `postgres://postgres@localhost:5432/vinculo_test`)
//! to run; without it the tests log a notice and pass. The schema from
//! `sql/schema.sql` is applied idempotently before each test.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;
use vinculo::credentials::{
    CredentialRecord, CredentialStore, InsertOutcome, NewCredential, PgCredentialStore,
    ResetAssignment, Role,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

async fn store() -> Result<Option<PgCredentialStore>> {
    let Ok(dsn) = std::env::var("VINCULO_TEST_DSN") else {
        eprintln!("Skipping postgres test: VINCULO_TEST_DSN not set");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&dsn)
        .await
        .context("Failed to connect to test database")?;
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(&pool)
        .await
        .context("Failed to apply schema")?;

    Ok(Some(PgCredentialStore::new(pool)))
}

// Unique per run so tests can share a database.
fn credential(tag: &str) -> NewCredential {
    let suffix = Uuid::new_v4().simple().to_string();
    NewCredential {
        document: format!("{tag}-{suffix}"),
        email: format!("{tag}-{suffix}@vinculo.test"),
        username: Some(format!("{tag}_{suffix}")),
        name: Some("Test".to_string()),
        last_name: None,
        password_hash: "$2b$04$placeholderplaceholderplaceholderplaceholderpla".to_string(),
        role: Role::Staff,
    }
}

async fn insert(store: &PgCredentialStore, new: NewCredential) -> Result<CredentialRecord> {
    match store.insert(new).await? {
        InsertOutcome::Created(record) => Ok(record),
        InsertOutcome::Conflict => anyhow::bail!("unexpected conflict"),
    }
}

#[tokio::test]
async fn insert_and_lookup() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    store.ping().await?;

    let new = credential("lookup");
    let document = new.document.clone();
    let username = new.username.clone().unwrap_or_default();
    let record = insert(&store, new).await?;
    assert_eq!(record.role, Role::Staff);
    assert!(record.reset_token.is_none());

    let by_document = store.find_by_identifier(&document).await?;
    assert_eq!(by_document.as_ref().map(|r| r.id), Some(record.id));
    let by_username = store.find_by_identifier(&username).await?;
    assert_eq!(by_username.map(|r| r.id), Some(record.id));
    let by_id = store.find_by_id(record.id).await?;
    assert_eq!(by_id.map(|r| r.document), Some(document));
    assert!(store.find_by_identifier("missing-identifier").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_document_conflicts() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let first = credential("dup");
    let mut second = credential("dup");
    second.document = first.document.clone();
    insert(&store, first).await?;

    assert!(matches!(store.insert(second).await?, InsertOutcome::Conflict));
    Ok(())
}

#[tokio::test]
async fn username_cannot_reuse_another_document() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let first = credential("shadow");
    let first_document = first.document.clone();
    let first_username = first.username.clone();
    insert(&store, first).await?;

    let mut username_clash = credential("shadow");
    username_clash.username = Some(first_document);
    assert!(matches!(store.insert(username_clash).await?, InsertOutcome::Conflict));

    let mut document_clash = credential("shadow");
    document_clash.document = first_username.unwrap_or_default();
    assert!(matches!(store.insert(document_clash).await?, InsertOutcome::Conflict));
    Ok(())
}

#[tokio::test]
async fn reset_token_is_single_use() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let new = credential("reset");
    let email = new.email.clone();
    let record = insert(&store, new).await?;

    let unknown = store
        .assign_reset_token("nobody@vinculo.test", Uuid::new_v4())
        .await?;
    assert!(matches!(unknown, ResetAssignment::UnknownEmail));

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    store.assign_reset_token(&email, first).await?;
    let assigned = store.assign_reset_token(&email, second).await?;
    match assigned {
        ResetAssignment::Assigned(updated) => assert_eq!(updated.reset_token, Some(second)),
        other => anyhow::bail!("unexpected assignment outcome: {other:?}"),
    }

    // Overwritten token no longer works.
    assert!(!store.consume_reset_token(first, "new-hash").await?);
    assert!(store.consume_reset_token(second, "new-hash").await?);
    assert!(!store.consume_reset_token(second, "other-hash").await?);

    let stored = store.find_by_id(record.id).await?.context("record vanished")?;
    assert_eq!(stored.password_hash, "new-hash");
    assert!(stored.reset_token.is_none());
    Ok(())
}

#[tokio::test]
async fn concurrent_consumes_succeed_once() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };

    let new = credential("race");
    let email = new.email.clone();
    insert(&store, new).await?;
    let token = Uuid::new_v4();
    store.assign_reset_token(&email, token).await?;

    let mut handles = Vec::new();
    for attempt in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .consume_reset_token(token, &format!("hash-{attempt}"))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await?? {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    Ok(())
}
