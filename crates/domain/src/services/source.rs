//! Complaint data source.
//!
//! The provider is chosen once at startup: in-memory for demos and tests,
//! PostgreSQL otherwise.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ReportError;
use crate::models::{
    ComplaintQuery, ComplaintRecord, ComplaintStatus, FeedbackRecord, ProfileRecord,
    SubmissionOrder,
};

/// Read and status-update access to complaints, feedback and profiles.
#[async_trait::async_trait]
pub trait ComplaintSource: Send + Sync {
    /// Complaints matching `query`, with their feedback, in the query's order.
    async fn fetch_complaints(
        &self,
        query: &ComplaintQuery,
    ) -> Result<Vec<ComplaintRecord>, ReportError>;

    /// Profiles created at or after `since` (all when `None`), newest first.
    async fn fetch_profiles(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProfileRecord>, ReportError>;

    /// Feedback joined with its complaint, optionally for one department.
    async fn fetch_feedback(
        &self,
        department: Option<&str>,
    ) -> Result<Vec<FeedbackRecord>, ReportError>;

    /// Sets a complaint's status. Resolving also stamps `resolved_at`.
    async fn update_status(
        &self,
        id: Uuid,
        status: ComplaintStatus,
        at: DateTime<Utc>,
    ) -> Result<ComplaintRecord, ReportError>;
}

/// Applies a status change to a record.
pub fn apply_status(record: &mut ComplaintRecord, status: ComplaintStatus, at: DateTime<Utc>) {
    record.status = status;
    record.updated_at = at;
    if status == ComplaintStatus::Resolved {
        record.resolved_at = Some(at);
    }
}

/// Complaint source backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryComplaintSource {
    complaints: RwLock<Vec<ComplaintRecord>>,
    profiles: RwLock<Vec<ProfileRecord>>,
    /// Whether every call fails, for testing error paths.
    pub simulate_failure: bool,
}

impl InMemoryComplaintSource {
    pub fn new(complaints: Vec<ComplaintRecord>, profiles: Vec<ProfileRecord>) -> Self {
        Self {
            complaints: RwLock::new(complaints),
            profiles: RwLock::new(profiles),
            simulate_failure: false,
        }
    }

    /// A source whose every call fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Default::default()
        }
    }

    pub async fn insert_complaint(&self, record: ComplaintRecord) {
        self.complaints.write().await.push(record);
    }

    pub async fn insert_profile(&self, profile: ProfileRecord) {
        self.profiles.write().await.push(profile);
    }

    fn check_available(&self) -> Result<(), ReportError> {
        if self.simulate_failure {
            tracing::warn!("In-memory complaint source simulating failure");
            return Err(ReportError::Source("Simulated data source failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ComplaintSource for InMemoryComplaintSource {
    async fn fetch_complaints(
        &self,
        query: &ComplaintQuery,
    ) -> Result<Vec<ComplaintRecord>, ReportError> {
        self.check_available()?;
        let mut rows: Vec<ComplaintRecord> = self
            .complaints
            .read()
            .await
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        match query.order {
            SubmissionOrder::OldestFirst => rows.sort_by_key(|r| r.submitted_at),
            SubmissionOrder::NewestFirst => {
                rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at))
            }
        }
        Ok(rows)
    }

    async fn fetch_profiles(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProfileRecord>, ReportError> {
        self.check_available()?;
        let mut profiles: Vec<ProfileRecord> = self
            .profiles
            .read()
            .await
            .iter()
            .filter(|p| since.map_or(true, |s| p.created_at >= s))
            .cloned()
            .collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    async fn fetch_feedback(
        &self,
        department: Option<&str>,
    ) -> Result<Vec<FeedbackRecord>, ReportError> {
        self.check_available()?;
        let complaints = self.complaints.read().await;
        Ok(complaints
            .iter()
            .filter(|c| department.map_or(true, |d| c.assigned_department.as_deref() == Some(d)))
            .flat_map(|c| {
                c.feedback.iter().map(move |f| FeedbackRecord {
                    id: f.id,
                    complaint_id: c.id,
                    rating: f.rating,
                    comment: f.comment.clone(),
                    submitted_at: f.submitted_at,
                    category: c.category.clone(),
                    priority: c.priority,
                    assigned_department: c.assigned_department.clone(),
                })
            })
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ComplaintStatus,
        at: DateTime<Utc>,
    ) -> Result<ComplaintRecord, ReportError> {
        self.check_available()?;
        let mut complaints = self.complaints.write().await;
        let record = complaints
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ReportError::NotFound(format!("Complaint {} not found", id)))?;
        apply_status(record, status, at);
        Ok(record.clone())
    }
}
