use anyhow::{Context, Result};
use sqlx::PgPool;
use std::env;
use std::sync::Arc;
use stickertags::db::*;
use stickertags::errors::StoreError;
use stickertags::tag_index::TagIndex;

/// Helper macro to skip tests when database is not available
macro_rules! skip_if_no_db {
    ($test_fn:expr) => {
        match setup_test_db().await {
            Ok(pool) => $test_fn(&pool).await,
            Err(_) => {
                eprintln!("Skipping test: Database not available");
                Ok(())
            }
        }
    };
}

async fn setup_test_db() -> Result<PgPool> {
    // Skip tests if no DATABASE_URL is provided
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping database tests: DATABASE_URL not set");
            return Err(anyhow::anyhow!("Test database not configured"));
        }
    };

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to test database")?;

    // Tests run in parallel, so each one owns a distinct set of tags
    init_database_schema(&pool).await?;

    Ok(pool)
}

async fn clear_tags(pool: &PgPool, tags: &[&str]) -> Result<()> {
    for tag in tags {
        sqlx::query("DELETE FROM sticker_tags WHERE tag = $1")
            .bind(tag)
            .execute(pool)
            .await?;
    }
    Ok(())
}

type UpdateResult = std::result::Result<Option<Vec<u8>>, StoreError>;

#[tokio::test]
async fn test_store_operations() -> Result<()> {
    skip_if_no_db!(test_store_operations_impl)
}

async fn test_store_operations_impl(pool: &PgPool) -> Result<()> {
    let key = "db-test-store-ops";
    clear_tags(pool, &[key]).await?;
    let store = PgTagStore::new(pool.clone());

    assert_eq!(store.get(key).await?, None);

    store
        .update(
            key,
            Box::new(|current: Option<&[u8]>| -> UpdateResult {
                assert!(current.is_none());
                Ok(Some(b"first".to_vec()))
            }),
        )
        .await?;
    assert_eq!(store.get(key).await?, Some(b"first".to_vec()));

    // Overwrite sees the previous value
    store
        .update(
            key,
            Box::new(|current: Option<&[u8]>| -> UpdateResult {
                assert_eq!(current, Some(&b"first"[..]));
                Ok(Some(b"second".to_vec()))
            }),
        )
        .await?;
    assert_eq!(store.get(key).await?, Some(b"second".to_vec()));

    store.delete(key).await?;
    assert_eq!(store.get(key).await?, None);

    // Deleting again is not an error
    store.delete(key).await?;

    Ok(())
}

#[tokio::test]
async fn test_failed_update_writes_nothing() -> Result<()> {
    skip_if_no_db!(test_failed_update_writes_nothing_impl)
}

async fn test_failed_update_writes_nothing_impl(pool: &PgPool) -> Result<()> {
    let key = "db-test-failed-update";
    clear_tags(pool, &[key]).await?;
    let store = PgTagStore::new(pool.clone());

    let result = store
        .update(
            key,
            Box::new(|_: Option<&[u8]>| -> UpdateResult {
                Err(StoreError::CorruptEntry {
                    tag: "db-test-failed-update".to_string(),
                    reason: "test".to_string(),
                })
            }),
        )
        .await;
    assert!(matches!(result, Err(StoreError::CorruptEntry { .. })));
    assert_eq!(store.get(key).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_tag_index_on_postgres() -> Result<()> {
    skip_if_no_db!(test_tag_index_on_postgres_impl)
}

async fn test_tag_index_on_postgres_impl(pool: &PgPool) -> Result<()> {
    let tags = ["db-test-caf\u{00e9}", "db-test-dog"];
    clear_tags(pool, &tags).await?;
    let index = TagIndex::new(Arc::new(PgTagStore::new(pool.clone())));

    index.add_sticker("db-test-cafe\u{0301}", "S1").await?;
    index.add_sticker("db-test-caf\u{00e9}", "S2").await?;
    index.add_sticker("db-test-caf\u{00e9}", "S1").await?;
    index.add_sticker("db-test-dog", "S3").await?;

    assert_eq!(
        index.lookup("db-test-caf\u{00e9}").await?,
        vec!["S1".to_string(), "S2".to_string()]
    );

    index.delete_tag("db-test-cafe\u{0301}").await?;
    assert!(index.lookup("db-test-caf\u{00e9}").await?.is_empty());
    assert_eq!(index.lookup("db-test-dog").await?, vec!["S3".to_string()]);

    clear_tags(pool, &tags).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_on_postgres() -> Result<()> {
    skip_if_no_db!(test_concurrent_adds_on_postgres_impl)
}

async fn test_concurrent_adds_on_postgres_impl(pool: &PgPool) -> Result<()> {
    let tag = "db-test-concurrent";
    clear_tags(pool, &[tag]).await?;
    let index = TagIndex::new(Arc::new(PgTagStore::new(pool.clone())));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let index = index.clone();
            tokio::spawn(async move { index.add_sticker(tag, &format!("S{i}")).await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    assert_eq!(index.lookup(tag).await?.len(), 16);

    clear_tags(pool, &[tag]).await?;
    Ok(())
}
