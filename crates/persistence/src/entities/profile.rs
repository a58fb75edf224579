//! Profile entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ProfileRecord, UserRole};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub role: String,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileEntity> for ProfileRecord {
    fn from(entity: ProfileEntity) -> Self {
        Self {
            id: entity.id,
            role: entity.role.parse::<UserRole>().unwrap_or(UserRole::Citizen),
            department: entity.department,
            created_at: entity.created_at,
        }
    }
}
