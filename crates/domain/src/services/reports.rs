//! Report generation.
//!
//! Each report fetches rows from the [`ComplaintSource`] scoped to the
//! viewer, aggregates them, and is memoised through [`with_cache`] under an
//! endpoint-specific key.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use shared::cache_key::CacheParams;
use shared::validation::parse_date_filter;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::aggregation;
use super::cache::{with_cache, CacheStore};
use super::prediction;
use super::source::ComplaintSource;
use crate::error::ReportError;
use crate::models::report::{
    ComplaintReport, ComplaintReportFilters, EscalationReport, FeedbackReport, ReportData,
    UserActivityReport, UserFeedback, UNASSIGNED_DEPARTMENT,
};
use crate::models::{
    ComplaintPriority, ComplaintQuery, ComplaintRecord, ComplaintStatus, Period,
    PredictionQuery, PredictionResponse, SubmissionOrder, UserRole, Viewer,
};

pub const DASHBOARD_STATS: &str = "dashboard_stats";
pub const ESCALATION_REPORT: &str = "escalation_report";
pub const COMPLAINTS_REPORT: &str = "complaints_report";
pub const FEEDBACK_SUMMARY: &str = "feedback_summary";
pub const USER_ACTIVITY: &str = "user_activity";

/// Every cache endpoint holding report data.
pub const REPORT_ENDPOINTS: [&str; 5] = [
    DASHBOARD_STATS,
    ESCALATION_REPORT,
    COMPLAINTS_REPORT,
    FEEDBACK_SUMMARY,
    USER_ACTIVITY,
];

/// Why a pending complaint needs attention, if it does.
///
/// Rules are checked in order: urgent over 7 days, high over 14 days, any
/// over 30 days, then manual escalation.
pub fn escalation_reason(
    priority: ComplaintPriority,
    status: ComplaintStatus,
    days_pending: i64,
) -> Option<&'static str> {
    if days_pending > 7 && priority == ComplaintPriority::Urgent {
        Some("Urgent complaint pending for more than 7 days")
    } else if days_pending > 14 && priority == ComplaintPriority::High {
        Some("High priority complaint pending for more than 14 days")
    } else if days_pending > 30 {
        Some("Complaint pending for more than 30 days")
    } else if status == ComplaintStatus::Escalated {
        Some("Manually escalated")
    } else {
        None
    }
}

/// Escalation line for a complaint, or `None` when no rule applies.
pub fn escalation_entry(record: &ComplaintRecord, now: DateTime<Utc>) -> Option<EscalationReport> {
    let days_pending = (now - record.submitted_at).num_days();
    let reason = escalation_reason(record.priority, record.status, days_pending)?;

    Some(EscalationReport {
        complaint_id: record.id,
        subject: record.subject.clone(),
        category: record.category.clone(),
        priority: record.priority,
        submitted_at: record.submitted_at,
        days_pending,
        assigned_department: department_label(record),
        escalation_reason: reason.to_string(),
    })
}

fn department_label(record: &ComplaintRecord) -> String {
    record
        .assigned_department
        .clone()
        .unwrap_or_else(|| UNASSIGNED_DEPARTMENT.to_string())
}

/// Complaint report row with resolution time in whole days.
pub fn complaint_entry(record: &ComplaintRecord) -> ComplaintReport {
    ComplaintReport {
        id: record.id,
        subject: record.subject.clone(),
        category: record.category.clone(),
        priority: record.priority,
        status: record.status,
        submitted_at: record.submitted_at,
        resolved_at: record.resolved_at,
        resolution_time: record.resolution_days(),
        assigned_department: department_label(record),
        user_feedback: record.feedback.first().map(|f| UserFeedback {
            rating: f.rating,
            comment: f.comment.clone().filter(|c| !c.is_empty()),
        }),
    }
}

fn parse_date(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, ReportError> {
    match value {
        None => Ok(None),
        Some(v) => parse_date_filter(v)
            .map(Some)
            .ok_or_else(|| ReportError::Validation(format!("Invalid {}: {}", field, v))),
    }
}

/// Generates reports for a viewer.
#[derive(Clone)]
pub struct ReportService {
    source: Arc<dyn ComplaintSource>,
    cache: Arc<dyn CacheStore>,
}

impl ReportService {
    pub fn new(source: Arc<dyn ComplaintSource>, cache: Arc<dyn CacheStore>) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &Arc<dyn ComplaintSource> {
        &self.source
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    async fn cached<T, F, Fut>(
        &self,
        endpoint: &str,
        params: &CacheParams,
        viewer: &Viewer,
        department: Option<&str>,
        fetch: F,
    ) -> Result<T, ReportError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ReportError>>,
    {
        let user_key = viewer.user_key();
        with_cache(
            self.cache.as_ref(),
            endpoint,
            params,
            Some(&user_key),
            department,
            fetch,
        )
        .await
    }

    /// Dashboard figures for the trailing `period` window.
    ///
    /// Authorities only see their department. Department performance is
    /// included for admins only.
    pub async fn dashboard_report(
        &self,
        viewer: &Viewer,
        period: Period,
    ) -> Result<ReportData, ReportError> {
        let params = CacheParams::new().with("period", Some(period));

        self.cached(
            DASHBOARD_STATS,
            &params,
            viewer,
            viewer.department.as_deref(),
            || async {
                let now = Utc::now();
                let start = period.window_start(now);

                let query = ComplaintQuery::new()
                    .submitted_since(start)
                    .in_department(viewer.department_scope().map(str::to_string));
                let complaints = self.source.fetch_complaints(&query).await?;
                let profiles = self.source.fetch_profiles(Some(start)).await?;

                tracing::debug!(
                    user_id = %viewer.user_id,
                    period = %period,
                    complaints = complaints.len(),
                    "Generating dashboard report"
                );

                Ok(aggregation::dashboard(
                    &complaints,
                    &profiles,
                    viewer.is_admin(),
                    now,
                ))
            },
        )
        .await
    }

    /// Pending and escalated complaints that meet an escalation rule, oldest
    /// first.
    ///
    /// An explicit `department` filter takes precedence over an authority's
    /// own department.
    pub async fn escalation_report(
        &self,
        viewer: &Viewer,
        department: Option<&str>,
    ) -> Result<Vec<EscalationReport>, ReportError> {
        let department = department.filter(|d| !d.is_empty());
        let params = CacheParams::new().with("department", department);

        self.cached(
            ESCALATION_REPORT,
            &params,
            viewer,
            viewer.department.as_deref(),
            || async {
                let scope = department.or_else(|| viewer.department_scope());
                let query = ComplaintQuery::new()
                    .with_statuses(vec![ComplaintStatus::Pending, ComplaintStatus::Escalated])
                    .in_department(scope.map(str::to_string))
                    .ordered(SubmissionOrder::OldestFirst);
                let complaints = self.source.fetch_complaints(&query).await?;

                let now = Utc::now();
                Ok(complaints
                    .iter()
                    .filter_map(|c| escalation_entry(c, now))
                    .collect())
            },
        )
        .await
    }

    /// Complaint rows matching `filters`, newest first.
    ///
    /// Authorities are confined to their department and citizens to their
    /// own complaints.
    pub async fn complaint_report(
        &self,
        viewer: &Viewer,
        filters: &ComplaintReportFilters,
    ) -> Result<Vec<ComplaintReport>, ReportError> {
        let params = CacheParams::new()
            .with("start_date", filters.start_date.as_deref())
            .with("end_date", filters.end_date.as_deref())
            .with("category", filters.category.as_deref())
            .with("department", filters.department.as_deref())
            .with("status", filters.status.as_deref());

        self.cached(
            COMPLAINTS_REPORT,
            &params,
            viewer,
            viewer.department.as_deref(),
            || async {
                let requested = filters.department.as_deref().filter(|d| !d.is_empty());
                let department = match (requested, viewer.department_scope()) {
                    (Some(r), Some(own)) if r != own => return Ok(Vec::new()),
                    (r, own) => own.or(r),
                };

                let mut query = ComplaintQuery::new()
                    .in_category(filters.category.clone().filter(|c| !c.is_empty()))
                    .in_department(department.map(str::to_string))
                    .ordered(SubmissionOrder::NewestFirst);
                if let Some(from) = parse_date(filters.start_date.as_deref(), "start_date")? {
                    query = query.submitted_since(from);
                }
                if let Some(to) = parse_date(filters.end_date.as_deref(), "end_date")? {
                    query = query.submitted_until(to);
                }
                if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
                    let status = status
                        .parse::<ComplaintStatus>()
                        .map_err(ReportError::Validation)?;
                    query = query.with_statuses(vec![status]);
                }
                if viewer.role == UserRole::Citizen {
                    query = query.for_user(viewer.user_id);
                }

                let complaints = self.source.fetch_complaints(&query).await?;
                Ok(complaints.iter().map(complaint_entry).collect())
            },
        )
        .await
    }

    /// Feedback totals, optionally for one department.
    ///
    /// Without an explicit department, authorities see their own.
    pub async fn feedback_summary(
        &self,
        viewer: &Viewer,
        department: Option<&str>,
    ) -> Result<FeedbackReport, ReportError> {
        let department = department.filter(|d| !d.is_empty());
        let params = CacheParams::new().with("department", department);

        self.cached(
            FEEDBACK_SUMMARY,
            &params,
            viewer,
            viewer.department.as_deref(),
            || async {
                let scope = department.or_else(|| viewer.department_scope());
                let feedback = self.source.fetch_feedback(scope).await?;
                Ok(aggregation::feedback_report(&feedback))
            },
        )
        .await
    }

    /// Registration totals across all users.
    pub async fn user_activity_report(
        &self,
        viewer: &Viewer,
    ) -> Result<UserActivityReport, ReportError> {
        let department = if viewer.is_admin() {
            None
        } else {
            viewer.department.as_deref()
        };

        self.cached(
            USER_ACTIVITY,
            &CacheParams::new(),
            viewer,
            department,
            || async {
                let profiles = self.source.fetch_profiles(None).await?;
                Ok(aggregation::user_activity(&profiles, Utc::now()))
            },
        )
        .await
    }

    /// Historical buckets and predicted volumes for all complaints.
    pub async fn trend_forecast(
        &self,
        query: &PredictionQuery,
    ) -> Result<PredictionResponse, ReportError> {
        let complaints = self
            .source
            .fetch_complaints(&ComplaintQuery::new().ordered(SubmissionOrder::OldestFirst))
            .await?;
        Ok(prediction::trend_forecast(&complaints, query))
    }

    /// Changes a complaint's status and drops every cached report.
    pub async fn update_complaint_status(
        &self,
        viewer: &Viewer,
        id: Uuid,
        status: ComplaintStatus,
    ) -> Result<ComplaintRecord, ReportError> {
        if !viewer.can_update_status() {
            return Err(ReportError::Forbidden(
                "Only authorities and admins can update complaint status".to_string(),
            ));
        }

        let updated = self.source.update_status(id, status, Utc::now()).await?;

        tracing::info!(
            complaint_id = %id,
            status = %status,
            updated_by = %viewer.user_id,
            "Complaint status updated"
        );

        self.invalidate_reports().await;
        Ok(updated)
    }

    /// Drops cached data for every report endpoint. Failures are logged.
    pub async fn invalidate_reports(&self) {
        for endpoint in REPORT_ENDPOINTS {
            if let Err(e) = self.cache.invalidate_endpoint(endpoint).await {
                tracing::warn!(endpoint = endpoint, error = %e, "Failed to invalidate report cache");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfileRecord, UserRole};
    use crate::services::cache::InMemoryCacheStore;
    use crate::services::fixtures::{complaint, profile, rating, resolved};
    use crate::services::source::InMemoryComplaintSource;
    use chrono::Duration;

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    fn viewer(role: UserRole, department: Option<&str>) -> Viewer {
        Viewer::new(Uuid::new_v4(), role, department.map(str::to_string))
    }

    fn in_department(mut record: ComplaintRecord, department: &str) -> ComplaintRecord {
        record.assigned_department = Some(department.to_string());
        record
    }

    fn service(
        complaints: Vec<ComplaintRecord>,
        profiles: Vec<ProfileRecord>,
    ) -> (ReportService, Arc<InMemoryComplaintSource>, Arc<InMemoryCacheStore>) {
        let source = Arc::new(InMemoryComplaintSource::new(complaints, profiles));
        let cache = Arc::new(InMemoryCacheStore::new());
        (
            ReportService::new(source.clone(), cache.clone()),
            source,
            cache,
        )
    }

    #[test]
    fn test_escalation_rules() {
        use ComplaintPriority::*;
        use ComplaintStatus::*;

        assert_eq!(
            escalation_reason(Urgent, Pending, 8),
            Some("Urgent complaint pending for more than 7 days")
        );
        assert_eq!(escalation_reason(Urgent, Pending, 7), None);
        assert_eq!(
            escalation_reason(High, Pending, 15),
            Some("High priority complaint pending for more than 14 days")
        );
        assert_eq!(escalation_reason(High, Pending, 14), None);
        assert_eq!(
            escalation_reason(Low, Pending, 31),
            Some("Complaint pending for more than 30 days")
        );
        assert_eq!(escalation_reason(Medium, Escalated, 1), Some("Manually escalated"));
        assert_eq!(
            escalation_reason(Urgent, Escalated, 9),
            Some("Urgent complaint pending for more than 7 days")
        );
    }

    #[test]
    fn test_complaint_entry_fields() {
        let mut record = resolved(days(10), Duration::hours(80));
        record.assigned_department = None;
        record.feedback = vec![rating(4), rating(1)];

        let entry = complaint_entry(&record);
        assert_eq!(entry.resolution_time, Some(3));
        assert_eq!(entry.assigned_department, "Unassigned");
        assert_eq!(entry.user_feedback.unwrap().rating, 4);
    }

    #[tokio::test]
    async fn test_ten_complaints_six_resolved() {
        let mut rows: Vec<ComplaintRecord> =
            (0..6).map(|_| resolved(days(3), days(1))).collect();
        rows.extend((0..4).map(|_| complaint(ComplaintStatus::Pending, days(2))));
        let (service, _, _) = service(rows, vec![]);

        let report = service
            .dashboard_report(&viewer(UserRole::Admin, None), Period::Month)
            .await
            .unwrap();
        assert_eq!(report.total_complaints, 10);
        assert!((report.resolution_rate - 60.0).abs() < 1e-9);
        assert_eq!(report.pending_complaints, 4);
        assert_eq!(report.department_performance.len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_scoped_to_authority_department() {
        let rows = vec![
            in_department(complaint(ComplaintStatus::Pending, days(1)), "Water"),
            in_department(complaint(ComplaintStatus::Pending, days(1)), "Roads"),
            in_department(complaint(ComplaintStatus::Pending, days(40)), "Water"),
        ];
        let (service, _, _) = service(rows, vec![profile(UserRole::Citizen, None, days(1))]);

        let report = service
            .dashboard_report(&viewer(UserRole::Authority, Some("Water")), Period::Month)
            .await
            .unwrap();
        assert_eq!(report.total_complaints, 1);
        assert_eq!(report.new_registrations, 1);
        assert!(report.department_performance.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_served_from_cache() {
        let (service, source, _) =
            service(vec![complaint(ComplaintStatus::Pending, days(1))], vec![]);
        let admin = viewer(UserRole::Admin, None);

        let first = service.dashboard_report(&admin, Period::Week).await.unwrap();
        source
            .insert_complaint(complaint(ComplaintStatus::Pending, days(1)))
            .await;
        let second = service.dashboard_report(&admin, Period::Week).await.unwrap();

        assert_eq!(first.total_complaints, 1);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let service = ReportService::new(
            Arc::new(InMemoryComplaintSource::failing()),
            Arc::new(InMemoryCacheStore::new()),
        );
        let err = service
            .dashboard_report(&viewer(UserRole::Admin, None), Period::Month)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Source(_)));
    }

    #[tokio::test]
    async fn test_cache_failure_does_not_propagate() {
        let service = ReportService::new(
            Arc::new(InMemoryComplaintSource::new(
                vec![complaint(ComplaintStatus::Pending, days(1))],
                vec![],
            )),
            Arc::new(InMemoryCacheStore::failing()),
        );
        let report = service
            .user_activity_report(&viewer(UserRole::Admin, None))
            .await
            .unwrap();
        assert_eq!(report.total_users, 0);
    }

    #[tokio::test]
    async fn test_escalation_report() {
        let mut urgent = complaint(ComplaintStatus::Pending, days(9));
        urgent.priority = ComplaintPriority::Urgent;
        let mut manual = complaint(ComplaintStatus::Escalated, days(1));
        manual.assigned_department = None;
        let fresh = complaint(ComplaintStatus::Pending, days(2));
        let mut old_resolved = complaint(ComplaintStatus::Resolved, days(60));
        old_resolved.priority = ComplaintPriority::Urgent;

        let (service, _, _) = service(vec![manual, fresh, urgent.clone(), old_resolved], vec![]);
        let report = service
            .escalation_report(&viewer(UserRole::Admin, None), None)
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].complaint_id, urgent.id);
        assert_eq!(report[0].days_pending, 9);
        assert_eq!(report[1].escalation_reason, "Manually escalated");
        assert_eq!(report[1].assigned_department, "Unassigned");
    }

    #[tokio::test]
    async fn test_complaint_report_citizen_sees_own() {
        let citizen = viewer(UserRole::Citizen, None);
        let mut own = complaint(ComplaintStatus::Pending, days(2));
        own.user_id = citizen.user_id;
        let other = complaint(ComplaintStatus::Pending, days(1));

        let (service, _, _) = service(vec![own.clone(), other], vec![]);
        let report = service
            .complaint_report(&citizen, &ComplaintReportFilters::default())
            .await
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, own.id);
    }

    #[tokio::test]
    async fn test_complaint_report_filters_newest_first() {
        let older = complaint(ComplaintStatus::Resolved, days(5));
        let newer = complaint(ComplaintStatus::Resolved, days(1));
        let pending = complaint(ComplaintStatus::Pending, days(1));
        let (service, _, _) = service(vec![older.clone(), newer.clone(), pending], vec![]);

        let filters = ComplaintReportFilters {
            status: Some("resolved".into()),
            ..Default::default()
        };
        let report = service
            .complaint_report(&viewer(UserRole::Admin, None), &filters)
            .await
            .unwrap();
        let ids: Vec<Uuid> = report.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_complaint_report_authority_other_department_is_empty() {
        let rows = vec![in_department(complaint(ComplaintStatus::Pending, days(1)), "Roads")];
        let (service, _, _) = service(rows, vec![]);
        let filters = ComplaintReportFilters {
            department: Some("Roads".into()),
            ..Default::default()
        };
        let report = service
            .complaint_report(&viewer(UserRole::Authority, Some("Water")), &filters)
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_feedback_summary_scoped() {
        let mut water = in_department(complaint(ComplaintStatus::Resolved, days(2)), "Water");
        water.feedback = vec![rating(2)];
        let mut roads = in_department(complaint(ComplaintStatus::Resolved, days(2)), "Roads");
        roads.feedback = vec![rating(5), rating(4)];
        let (service, _, _) = service(vec![water, roads], vec![]);

        let authority = viewer(UserRole::Authority, Some("Roads"));
        let own = service.feedback_summary(&authority, None).await.unwrap();
        assert_eq!(own.total_feedbacks, 2);
        assert!((own.average_rating - 4.5).abs() < 1e-9);

        let explicit = service
            .feedback_summary(&viewer(UserRole::Admin, None), Some("Water"))
            .await
            .unwrap();
        assert_eq!(explicit.total_feedbacks, 1);
    }

    #[tokio::test]
    async fn test_status_update_requires_authority() {
        let record = complaint(ComplaintStatus::Pending, days(1));
        let (service, _, _) = service(vec![record.clone()], vec![]);
        let err = service
            .update_complaint_status(
                &viewer(UserRole::Citizen, None),
                record.id,
                ComplaintStatus::Resolved,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_status_update_invalidates_reports() {
        let record = complaint(ComplaintStatus::Pending, days(1));
        let (service, _, cache) = service(vec![record.clone()], vec![]);
        let admin = viewer(UserRole::Admin, None);

        let before = service.dashboard_report(&admin, Period::Week).await.unwrap();
        assert_eq!(before.resolved_complaints, 0);
        assert!(!cache.is_empty().await);

        let updated = service
            .update_complaint_status(&admin, record.id, ComplaintStatus::Resolved)
            .await
            .unwrap();
        assert!(updated.resolved_at.is_some());
        assert!(cache.is_empty().await);

        let after = service.dashboard_report(&admin, Period::Week).await.unwrap();
        assert_eq!(after.resolved_complaints, 1);
    }

    #[tokio::test]
    async fn test_trend_forecast_uses_all_complaints() {
        let rows = vec![
            complaint(ComplaintStatus::Pending, days(1)),
            complaint(ComplaintStatus::Pending, days(2)),
        ];
        let (service, _, _) = service(rows, vec![]);
        let response = service
            .trend_forecast(&PredictionQuery::default())
            .await
            .unwrap();
        assert_eq!(
            response.historical.iter().map(|b| b.total).sum::<i64>(),
            2
        );
        assert_eq!(response.metadata.prediction_months, 3);
    }
}
