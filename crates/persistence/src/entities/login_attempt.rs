//! Login attempt window entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::services::AttemptWindow;
use sqlx::FromRow;

/// Database row mapping for the login_attempts table.
#[derive(Debug, Clone, FromRow)]
pub struct LoginAttemptEntity {
    pub identifier: String,
    pub attempt_count: i32,
    pub window_start: DateTime<Utc>,
}

impl From<LoginAttemptEntity> for AttemptWindow {
    fn from(entity: LoginAttemptEntity) -> Self {
        Self {
            count: entity.attempt_count,
            window_start: entity.window_start,
        }
    }
}
