//! Report models.
//!
//! JSON field names are camelCase to match the dashboard client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_date_filter, validate_filter_value};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use super::complaint::{ComplaintPriority, ComplaintStatus};

/// Shown in place of a missing department.
pub const UNASSIGNED_DEPARTMENT: &str = "Unassigned";

/// Counts keyed by category, priority, department or role.
pub type Breakdown = BTreeMap<String, i64>;

/// One point of a dashboard trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `Week d/m` or `Mon YYYY`.
    pub period: String,
    pub submitted: i64,
    pub resolved: i64,
    pub pending: i64,
}

/// Feedback totals across a set of complaints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub total_feedbacks: i64,
    pub average_rating: f64,
    pub rating_distribution: BTreeMap<i32, i64>,
}

/// Per-department performance line (admin dashboards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPerformance {
    pub department: String,
    pub total_assigned: i64,
    pub resolved: i64,
    pub pending: i64,
    pub average_resolution_time: f64,
    pub satisfaction_score: f64,
}

/// Dashboard report for a period window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub total_complaints: i64,
    pub pending_complaints: i64,
    pub in_progress_complaints: i64,
    pub resolved_complaints: i64,
    pub escalated_complaints: i64,
    pub closed_complaints: i64,

    /// Mean days from submission to resolution.
    pub average_resolution_time: f64,
    pub resolution_rate: f64,
    pub escalation_rate: f64,
    pub satisfaction_score: f64,

    pub complaints_by_category: Breakdown,
    pub complaints_by_priority: Breakdown,
    pub complaints_by_department: Breakdown,

    pub monthly_trends: Vec<TrendPoint>,
    pub weekly_trends: Vec<TrendPoint>,

    pub active_users: i64,
    pub new_registrations: i64,
    pub users_by_role: Breakdown,

    pub feedback_summary: FeedbackSummary,
    pub department_performance: Vec<DepartmentPerformance>,
}

/// A complaint flagged for escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationReport {
    pub complaint_id: Uuid,
    pub subject: String,
    pub category: String,
    pub priority: ComplaintPriority,
    pub submitted_at: DateTime<Utc>,
    pub days_pending: i64,
    pub assigned_department: String,
    pub escalation_reason: String,
}

/// First feedback attached to a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFeedback {
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One row of the complaint report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintReport {
    pub id: Uuid,
    pub subject: String,
    pub category: String,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Whole days to resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_time: Option<i64>,
    pub assigned_department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<UserFeedback>,
}

/// Filters for the complaint report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ComplaintReportFilters {
    /// RFC 3339 timestamp or `YYYY-MM-DD`, inclusive.
    #[serde(default)]
    #[validate(custom(function = "validate_date_filter"))]
    pub start_date: Option<String>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`, inclusive.
    #[serde(default)]
    #[validate(custom(function = "validate_date_filter"))]
    pub end_date: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_filter_value"))]
    pub category: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_filter_value"))]
    pub department: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_status_filter"))]
    pub status: Option<String>,
}

impl ComplaintReportFilters {
    /// Parsed status filter. Callers validate first.
    pub fn status(&self) -> Option<ComplaintStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

fn validate_status_filter(status: &str) -> Result<(), validator::ValidationError> {
    status.parse::<ComplaintStatus>().map(|_| ()).map_err(|_| {
        let mut err = validator::ValidationError::new("invalid_status");
        err.message = Some(format!("Unknown complaint status '{}'", status).into());
        err
    })
}

/// Feedback totals for one complaint category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFeedback {
    pub total: i64,
    pub average_rating: f64,
}

/// Feedback report, optionally scoped to a department.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub total_feedbacks: i64,
    pub average_rating: f64,
    pub rating_distribution: BTreeMap<i32, i64>,
    pub feedback_by_category: BTreeMap<String, CategoryFeedback>,
}

/// User registration report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityReport {
    pub total_users: i64,
    pub new_users_this_month: i64,
    pub users_by_role: Breakdown,
    pub users_by_department: Breakdown,
}
