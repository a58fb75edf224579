//! Complaint and feedback entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{
    ComplaintPriority, ComplaintRecord, ComplaintStatus, FeedbackEntry, FeedbackRecord,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the complaints table.
#[derive(Debug, Clone, FromRow)]
pub struct ComplaintEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub assigned_department: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ComplaintEntity {
    /// Convert to domain model with the given feedback attached.
    ///
    /// Unrecognised priorities read as medium, unrecognised statuses as pending.
    pub fn into_domain(self, feedback: Vec<FeedbackEntry>) -> ComplaintRecord {
        let priority = self
            .priority
            .parse::<ComplaintPriority>()
            .unwrap_or(ComplaintPriority::Medium);
        let status = self
            .status
            .parse::<ComplaintStatus>()
            .unwrap_or(ComplaintStatus::Pending);

        ComplaintRecord {
            id: self.id,
            user_id: self.user_id,
            subject: self.subject,
            category: self.category,
            priority,
            status,
            assigned_department: self.assigned_department,
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
            feedback,
        }
    }
}

/// Database row mapping for the complaint_feedback table.
#[derive(Debug, Clone, FromRow)]
pub struct FeedbackEntity {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl From<FeedbackEntity> for FeedbackEntry {
    fn from(entity: FeedbackEntity) -> Self {
        Self {
            id: entity.id,
            rating: entity.rating,
            comment: entity.comment,
            submitted_at: entity.submitted_at,
        }
    }
}

/// Feedback row joined with its complaint.
#[derive(Debug, Clone, FromRow)]
pub struct FeedbackWithComplaintEntity {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub category: String,
    pub priority: String,
    pub assigned_department: Option<String>,
}

impl From<FeedbackWithComplaintEntity> for FeedbackRecord {
    fn from(entity: FeedbackWithComplaintEntity) -> Self {
        Self {
            id: entity.id,
            complaint_id: entity.complaint_id,
            rating: entity.rating,
            comment: entity.comment,
            submitted_at: entity.submitted_at,
            category: entity.category,
            priority: entity
                .priority
                .parse::<ComplaintPriority>()
                .unwrap_or(ComplaintPriority::Medium),
            assigned_department: entity.assigned_department,
        }
    }
}
