//! Cache entry repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use domain::models::cache::MAX_TTL_SECS;
use domain::models::{CacheEntry, CacheLookup};
use domain::services::{CacheError, CacheStore};
use serde_json::Value;
use sqlx::PgPool;

use crate::entities::CacheEntryEntity;
use crate::metrics::QueryTimer;

fn backend(err: sqlx::Error) -> CacheError {
    CacheError::Backend(err.to_string())
}

/// Report cache stored in the `cache` table.
///
/// Expiry is checked on read against the endpoint's TTL. Rows older than the
/// longest TTL are removed by [`CacheStore::purge_expired`].
#[derive(Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    /// Creates a new PgCacheStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes rows older than `max_age_secs`. Returns the number removed.
    pub(crate) async fn purge_older_than(&self, max_age_secs: i64) -> Result<u64, CacheError> {
        let timer = QueryTimer::new("purge_cache_entries");
        let result = sqlx::query(
            r#"
            DELETE FROM cache
            WHERE created_at < NOW() - make_interval(secs => $1)
            "#,
        )
        .bind(max_age_secs as f64)
        .execute(&self.pool)
        .await;
        timer.record();

        let removed = result.map_err(backend)?.rows_affected();
        tracing::debug!(removed, max_age_secs, "Purged stale cache entries");
        Ok(removed)
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
        let timer = QueryTimer::new("get_cache_entry");
        let result = sqlx::query_as::<_, CacheEntryEntity>(
            r#"
            SELECT key, data, created_at
            FROM cache
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        let entry = result.map_err(backend)?.map(CacheEntry::from);
        Ok(match entry {
            Some(entry) if entry.is_fresh(Utc::now()) => CacheLookup::hit(entry.data),
            _ => CacheLookup::miss(),
        })
    }

    async fn set(&self, key: &str, data: Value) -> Result<(), CacheError> {
        let timer = QueryTimer::new("upsert_cache_entry");
        let result = sqlx::query(
            r#"
            INSERT INTO cache (key, data, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET
                data = EXCLUDED.data,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(key)
        .bind(data)
        .execute(&self.pool)
        .await;
        timer.record();

        result.map(|_| ()).map_err(backend)
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let timer = QueryTimer::new("delete_cache_entry");
        let result = sqlx::query("DELETE FROM cache WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await;
        timer.record();

        result.map(|_| ()).map_err(backend)
    }

    async fn invalidate_endpoint(&self, endpoint: &str) -> Result<(), CacheError> {
        // Prefix compare instead of LIKE: endpoint names contain '_'.
        let timer = QueryTimer::new("delete_cache_endpoint");
        let result = sqlx::query(
            r#"
            DELETE FROM cache
            WHERE key = $1 OR left(key, length($1) + 1) = $1 || ':'
            "#,
        )
        .bind(endpoint)
        .execute(&self.pool)
        .await;
        timer.record();

        result.map(|_| ()).map_err(backend)
    }

    async fn purge_expired(&self) -> Result<u64, CacheError> {
        self.purge_older_than(MAX_TTL_SECS as i64).await
    }
}
