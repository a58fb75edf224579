//! Cache entry entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::CacheEntry;
use sqlx::FromRow;

/// Database row mapping for the cache table.
#[derive(Debug, Clone, FromRow)]
pub struct CacheEntryEntity {
    pub key: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<CacheEntryEntity> for CacheEntry {
    fn from(entity: CacheEntryEntity) -> Self {
        Self {
            key: entity.key,
            data: entity.data,
            created_at: entity.created_at,
        }
    }
}
