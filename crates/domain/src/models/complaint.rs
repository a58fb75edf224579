//! Complaint, feedback and profile records as seen by the reporting layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::viewer::UserRole;

/// Complaint lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
    Escalated,
    Closed,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 5] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Escalated,
        ComplaintStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProgress => "inProgress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Escalated => "escalated",
            ComplaintStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ComplaintStatus::Pending),
            "inProgress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            "escalated" => Ok(ComplaintStatus::Escalated),
            "closed" => Ok(ComplaintStatus::Closed),
            _ => Err(format!("Invalid complaint status: {}", s)),
        }
    }
}

/// Complaint priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl ComplaintPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintPriority::Low => "low",
            ComplaintPriority::Medium => "medium",
            ComplaintPriority::High => "high",
            ComplaintPriority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for ComplaintPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplaintPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ComplaintPriority::Low),
            "medium" => Ok(ComplaintPriority::Medium),
            "high" => Ok(ComplaintPriority::High),
            "urgent" => Ok(ComplaintPriority::Urgent),
            _ => Err(format!("Invalid complaint priority: {}", s)),
        }
    }
}

/// A single feedback entry attached to a complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Complaint row with its feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub category: String,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub assigned_department: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
}

impl ComplaintRecord {
    /// Whole days between submission and resolution, if resolved.
    pub fn resolution_days(&self) -> Option<i64> {
        self.resolved_at
            .map(|resolved| (resolved - self.submitted_at).num_days())
    }
}

/// Feedback joined with the complaint it rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub category: String,
    pub priority: ComplaintPriority,
    pub assigned_department: Option<String>,
}

/// Profile fields needed for user analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: Uuid,
    pub role: UserRole,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Ordering of complaint rows by submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

/// Row filter for complaint fetches. Every `None` field is unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintQuery {
    pub submitted_from: Option<DateTime<Utc>>,
    pub submitted_to: Option<DateTime<Utc>>,
    pub statuses: Option<Vec<ComplaintStatus>>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub user_id: Option<Uuid>,
    pub order: SubmissionOrder,
}

impl ComplaintQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted_since(mut self, from: DateTime<Utc>) -> Self {
        self.submitted_from = Some(from);
        self
    }

    pub fn submitted_until(mut self, to: DateTime<Utc>) -> Self {
        self.submitted_to = Some(to);
        self
    }

    pub fn with_statuses(mut self, statuses: Vec<ComplaintStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    pub fn in_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn in_department(mut self, department: Option<String>) -> Self {
        self.department = department;
        self
    }

    pub fn for_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn ordered(mut self, order: SubmissionOrder) -> Self {
        self.order = order;
        self
    }

    /// Whether a record passes every filter. Bounds are inclusive.
    pub fn matches(&self, record: &ComplaintRecord) -> bool {
        if let Some(from) = self.submitted_from {
            if record.submitted_at < from {
                return false;
            }
        }
        if let Some(to) = self.submitted_to {
            if record.submitted_at > to {
                return false;
            }
        }
        if let Some(ref statuses) = self.statuses {
            if !statuses.contains(&record.status) {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if &record.category != category {
                return false;
            }
        }
        if let Some(ref department) = self.department {
            if record.assigned_department.as_ref() != Some(department) {
                return false;
            }
        }
        if let Some(user_id) = self.user_id {
            if record.user_id != user_id {
                return false;
            }
        }
        true
    }

    /// Status names for SQL binding.
    pub fn status_names(&self) -> Option<Vec<String>> {
        self.statuses
            .as_ref()
            .map(|s| s.iter().map(|st| st.as_str().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: ComplaintStatus) -> ComplaintRecord {
        let now = Utc::now();
        ComplaintRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subject: "Broken streetlight".to_string(),
            category: "infrastructure".to_string(),
            priority: ComplaintPriority::High,
            status,
            assigned_department: Some("Electricity".to_string()),
            submitted_at: now - Duration::days(3),
            updated_at: now,
            resolved_at: None,
            feedback: vec![],
        }
    }

    #[test]
    fn test_status_round_trip_names() {
        for status in ComplaintStatus::ALL {
            assert_eq!(status.as_str().parse::<ComplaintStatus>().unwrap(), status);
        }
        assert!("in_progress".parse::<ComplaintStatus>().is_err());
    }

    #[test]
    fn test_status_serialization_is_camel_case() {
        let json = serde_json::to_string(&ComplaintStatus::InProgress).unwrap();
        assert_eq!(json, "\"inProgress\"");
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(
            "urgent".parse::<ComplaintPriority>().unwrap(),
            ComplaintPriority::Urgent
        );
        assert!("critical".parse::<ComplaintPriority>().is_err());
    }

    #[test]
    fn test_resolution_days() {
        let mut r = record(ComplaintStatus::Resolved);
        assert_eq!(r.resolution_days(), None);
        r.resolved_at = Some(r.submitted_at + Duration::hours(60));
        assert_eq!(r.resolution_days(), Some(2));
    }

    #[test]
    fn test_query_matches_everything_by_default() {
        assert!(ComplaintQuery::new().matches(&record(ComplaintStatus::Pending)));
    }

    #[test]
    fn test_query_filters() {
        let r = record(ComplaintStatus::Pending);

        let by_status = ComplaintQuery::new().with_statuses(vec![ComplaintStatus::Escalated]);
        assert!(!by_status.matches(&r));

        let by_dept = ComplaintQuery::new().in_department(Some("Electricity".to_string()));
        assert!(by_dept.matches(&r));

        let other_dept = ComplaintQuery::new().in_department(Some("Water".to_string()));
        assert!(!other_dept.matches(&r));

        let by_user = ComplaintQuery::new().for_user(Uuid::new_v4());
        assert!(!by_user.matches(&r));

        let since = ComplaintQuery::new().submitted_since(Utc::now() - Duration::days(1));
        assert!(!since.matches(&r));

        let until = ComplaintQuery::new().submitted_until(r.submitted_at);
        assert!(until.matches(&r));
    }

    #[test]
    fn test_unassigned_never_matches_department() {
        let mut r = record(ComplaintStatus::Pending);
        r.assigned_department = None;
        let q = ComplaintQuery::new().in_department(Some("Electricity".to_string()));
        assert!(!q.matches(&r));
    }

    #[test]
    fn test_status_names() {
        let q = ComplaintQuery::new()
            .with_statuses(vec![ComplaintStatus::Pending, ComplaintStatus::InProgress]);
        assert_eq!(
            q.status_names().unwrap(),
            vec!["pending".to_string(), "inProgress".to_string()]
        );
        assert!(ComplaintQuery::new().status_names().is_none());
    }
}
