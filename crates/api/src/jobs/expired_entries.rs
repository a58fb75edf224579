//! Removes expired report cache entries and login attempt windows.

use domain::services::{AttemptLimiter, CacheStore};
use std::sync::Arc;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Keeps the cache and login attempt stores from growing with dead state.
pub struct ExpiredEntriesJob {
    cache: Arc<dyn CacheStore>,
    attempts: Arc<dyn AttemptLimiter>,
}

impl ExpiredEntriesJob {
    pub fn new(cache: Arc<dyn CacheStore>, attempts: Arc<dyn AttemptLimiter>) -> Self {
        Self { cache, attempts }
    }
}

#[async_trait::async_trait]
impl Job for ExpiredEntriesJob {
    fn name(&self) -> &'static str {
        "expired_entries"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(5)
    }

    async fn execute(&self) -> Result<(), String> {
        let cache_removed = self
            .cache
            .purge_expired()
            .await
            .map_err(|e| format!("Failed to purge cache entries: {}", e))?;

        let windows_removed = self
            .attempts
            .purge_expired()
            .await
            .map_err(|e| format!("Failed to purge login attempt windows: {}", e))?;

        info!(
            cache_entries = cache_removed,
            attempt_windows = windows_removed,
            "Purged expired entries"
        );
        Ok(())
    }
}
