//! Report routes.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use domain::models::{
    ComplaintReport, ComplaintReportFilters, EscalationReport, FeedbackReport, Period, ReportData,
    UserActivityReport,
};
use domain::services::export::{export_complaints, export_escalations};
use domain::services::ExportFormat;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentViewer, PathParams, QueryParams};

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// week, month, quarter or year. Unknown values mean month.
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentQuery {
    pub department: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// csv (default) or html.
    pub format: Option<String>,
    #[serde(flatten)]
    pub filters: ComplaintReportFilters,
}

/// GET /api/v1/reports/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    QueryParams(query): QueryParams<PeriodQuery>,
) -> Result<Json<ReportData>, ApiError> {
    let period = Period::parse_or_default(query.period.as_deref());
    let report = state.reports.dashboard_report(&viewer, period).await?;
    Ok(Json(report))
}

/// GET /api/v1/reports/escalations
pub async fn escalations(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    QueryParams(query): QueryParams<DepartmentQuery>,
) -> Result<Json<Vec<EscalationReport>>, ApiError> {
    let rows = state
        .reports
        .escalation_report(&viewer, query.department.as_deref())
        .await?;
    Ok(Json(rows))
}

/// GET /api/v1/reports/complaints
pub async fn complaints(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    QueryParams(filters): QueryParams<ComplaintReportFilters>,
) -> Result<Json<Vec<ComplaintReport>>, ApiError> {
    filters.validate()?;
    let rows = state.reports.complaint_report(&viewer, &filters).await?;
    Ok(Json(rows))
}

/// GET /api/v1/reports/feedback
pub async fn feedback(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    QueryParams(query): QueryParams<DepartmentQuery>,
) -> Result<Json<FeedbackReport>, ApiError> {
    let report = state
        .reports
        .feedback_summary(&viewer, query.department.as_deref())
        .await?;
    Ok(Json(report))
}

/// GET /api/v1/reports/user-activity
pub async fn user_activity(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<UserActivityReport>, ApiError> {
    let report = state.reports.user_activity_report(&viewer).await?;
    Ok(Json(report))
}

/// GET /api/v1/reports/:kind/export
///
/// `kind` is `complaints` or `escalations`. Complaint exports accept the
/// complaint report filters; escalation exports only `department`.
pub async fn export(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    PathParams(kind): PathParams<String>,
    QueryParams(query): QueryParams<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = query
        .format
        .as_deref()
        .unwrap_or("csv")
        .parse::<ExportFormat>()
        .map_err(ApiError::Validation)?;
    let today = Utc::now().date_naive();

    let exported = match kind.as_str() {
        "complaints" => {
            query.filters.validate()?;
            let rows = state
                .reports
                .complaint_report(&viewer, &query.filters)
                .await?;
            export_complaints(&rows, format, today)?
        }
        "escalations" => {
            let rows = state
                .reports
                .escalation_report(&viewer, query.filters.department.as_deref())
                .await?;
            export_escalations(&rows, format, today)?
        }
        other => {
            return Err(ApiError::NotFound(format!(
                "No exportable report named '{}'",
                other
            )))
        }
    };

    tracing::info!(
        user_id = %viewer.user_id,
        file_name = %exported.file_name,
        "Exported report"
    );

    Ok((
        [
            (header::CONTENT_TYPE, exported.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", exported.file_name),
            ),
        ],
        exported.body,
    ))
}
