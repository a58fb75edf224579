//! Read-through report cache.
//!
//! Report endpoints wrap their data fetch in [`with_cache`]. The cache is an
//! optimisation only: any cache failure degrades to a direct fetch.

use chrono::Utc;
use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::cache_key::{belongs_to_endpoint, generate_cache_key, CacheParams};
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{CacheEntry, CacheLookup};

/// Cache backend errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache payload error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache request rejected: {0}")]
    Rejected(String),
}

/// Storage for cache entries keyed by [`generate_cache_key`] output.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Fresh entry for `key`, or a miss.
    async fn get(&self, key: &str) -> Result<CacheLookup, CacheError>;

    /// Insert or replace the entry for `key`, restarting its TTL.
    async fn set(&self, key: &str, data: Value) -> Result<(), CacheError>;

    /// Remove the entry for `key`.
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry whose key was built for `endpoint`.
    async fn invalidate_endpoint(&self, endpoint: &str) -> Result<(), CacheError>;

    /// Drop expired entries. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, CacheError>;
}

/// Process-local cache store.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Whether every operation fails, for testing degradation.
    pub simulate_failure: bool,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails.
    pub fn failing() -> Self {
        Self {
            entries: RwLock::default(),
            simulate_failure: true,
        }
    }

    /// Store a pre-built entry, keeping its `created_at`.
    pub async fn insert_entry(&self, entry: CacheEntry) {
        self.entries.write().await.insert(entry.key.clone(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.simulate_failure {
            return Err(CacheError::Backend("Simulated cache failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
        self.check_available()?;
        let entries = self.entries.read().await;
        Ok(match entries.get(key) {
            Some(entry) if entry.is_fresh(Utc::now()) => CacheLookup::hit(entry.data.clone()),
            _ => CacheLookup::miss(),
        })
    }

    async fn set(&self, key: &str, data: Value) -> Result<(), CacheError> {
        self.check_available()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry::new(key, data));
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.check_available()?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn invalidate_endpoint(&self, endpoint: &str) -> Result<(), CacheError> {
        self.check_available()?;
        self.entries
            .write()
            .await
            .retain(|key, _| !belongs_to_endpoint(key, endpoint));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, CacheError> {
        self.check_available()?;
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        Ok((before - entries.len()) as u64)
    }
}

fn record_cache_event(endpoint: &str, outcome: &'static str) {
    counter!(
        "report_cache_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Returns the cached value for this query, or runs `fetch` and caches its
/// result.
///
/// `fetch` runs at most once and its error is returned unchanged. Lookup,
/// decode and store failures are logged and otherwise ignored.
pub async fn with_cache<T, E, F, Fut>(
    store: &dyn CacheStore,
    endpoint: &str,
    params: &CacheParams,
    user_id: Option<&str>,
    department: Option<&str>,
    fetch: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let key = generate_cache_key(endpoint, params, user_id, department);

    match store.get(&key).await {
        Ok(lookup) if lookup.is_hit() => {
            let data = lookup.data.unwrap_or(Value::Null);
            match serde_json::from_value::<T>(data) {
                Ok(value) => {
                    tracing::debug!(cache_key = %key, "Report cache hit");
                    record_cache_event(endpoint, "hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(cache_key = %key, error = %e, "Discarding undecodable cache entry");
                    record_cache_event(endpoint, "error");
                }
            }
        }
        Ok(_) => record_cache_event(endpoint, "miss"),
        Err(e) => {
            tracing::warn!(cache_key = %key, error = %e, "Cache lookup failed, fetching directly");
            record_cache_event(endpoint, "error");
        }
    }

    let value = fetch().await?;

    match serde_json::to_value(&value) {
        Ok(data) => {
            if let Err(e) = store.set(&key, data).await {
                tracing::warn!(cache_key = %key, error = %e, "Failed to store cache entry");
            }
        }
        Err(e) => {
            tracing::warn!(cache_key = %key, error = %e, "Failed to encode value for cache");
        }
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn params() -> CacheParams {
        CacheParams::new().with("period", Some("month"))
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let store = InMemoryCacheStore::new();
        let calls = AtomicUsize::new(0);

        let value: Result<Vec<i32>, String> =
            with_cache(&store, "dashboard_stats", &params(), Some("u1"), None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await;

        assert_eq!(value.unwrap(), vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let lookup = store
            .get("dashboard_stats:user=u1:period=month")
            .await
            .unwrap();
        assert!(lookup.is_hit());
    }

    #[tokio::test]
    async fn test_hit_skips_fetch() {
        let store = InMemoryCacheStore::new();
        store
            .set("dashboard_stats:period=month", json!({"total": 7}))
            .await
            .unwrap();

        let calls = AtomicUsize::new(0);

        let value: Result<Value, String> =
            with_cache(&store, "dashboard_stats", &params(), None, None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"total": 0}))
            })
            .await;

        assert_eq!(value.unwrap(), json!({"total": 7}));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_store_degrades_to_fetch() {
        let store = InMemoryCacheStore::failing();
        let calls = AtomicUsize::new(0);

        let value: Result<i32, String> =
            with_cache(&store, "feedback_summary", &CacheParams::new(), None, None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .await;

        assert_eq!(value.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_once() {
        let store = InMemoryCacheStore::new();
        let calls = AtomicUsize::new(0);

        let value: Result<i32, String> =
            with_cache(&store, "user_activity", &CacheParams::new(), None, None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("database unavailable".to_string())
            })
            .await;

        assert_eq!(value.unwrap_err(), "database unavailable");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_undecodable_entry_refetched() {
        let store = InMemoryCacheStore::new();
        store
            .set("escalation_report", json!("not a number"))
            .await
            .unwrap();

        let value: Result<i32, String> =
            with_cache(&store, "escalation_report", &CacheParams::new(), None, None, || async {
                Ok(5)
            })
            .await;

        assert_eq!(value.unwrap(), 5);
        assert_eq!(
            store.get("escalation_report").await.unwrap().data,
            Some(json!(5))
        );
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let store = InMemoryCacheStore::new();
        let mut entry = CacheEntry::new("complaints_list:user=u1", json!([1]));
        entry.created_at = Utc::now() - Duration::seconds(121);
        store.insert_entry(entry).await;

        let lookup = store.get("complaints_list:user=u1").await.unwrap();
        assert!(!lookup.cached);
        assert!(lookup.data.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_endpoint_leaves_other_endpoints() {
        let store = InMemoryCacheStore::new();
        for key in [
            "dashboard_stats",
            "dashboard_stats:period=week",
            "dashboard_stats_v2:period=week",
            "feedback_summary:dept=Water",
        ] {
            store.set(key, json!(1)).await.unwrap();
        }

        store.invalidate_endpoint("dashboard_stats").await.unwrap();

        assert_eq!(store.len().await, 2);
        assert!(store.get("feedback_summary:dept=Water").await.unwrap().is_hit());
        assert!(store
            .get("dashboard_stats_v2:period=week")
            .await
            .unwrap()
            .is_hit());
    }

    #[tokio::test]
    async fn test_purge_expired_drops_only_stale_entries() {
        let store = InMemoryCacheStore::new();
        let mut stale = CacheEntry::new("complaints_list:user=u1", json!([1]));
        stale.created_at = Utc::now() - Duration::seconds(121);
        store.insert_entry(stale).await;
        let mut aging = CacheEntry::new("reports:period=month", json!({"total": 1}));
        aging.created_at = Utc::now() - Duration::seconds(400);
        store.insert_entry(aging).await;
        store.set("dashboard_stats", json!({"total": 2})).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 2);
        assert!(!store.get("complaints_list:user=u1").await.unwrap().is_hit());
        assert!(store.get("reports:period=month").await.unwrap().is_hit());

        assert!(InMemoryCacheStore::failing().purge_expired().await.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_single_key() {
        let store = InMemoryCacheStore::new();
        store.set("reports:period=month", json!(1)).await.unwrap();
        store.invalidate("reports:period=month").await.unwrap();
        assert!(store.is_empty().await);
    }
}
