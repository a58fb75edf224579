//! Complaint repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    ComplaintQuery, ComplaintRecord, ComplaintStatus, FeedbackEntry, FeedbackRecord,
    ProfileRecord, SubmissionOrder,
};
use domain::services::ComplaintSource;
use domain::ReportError;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{ComplaintEntity, FeedbackEntity, FeedbackWithComplaintEntity, ProfileEntity};
use crate::metrics::QueryTimer;

const COMPLAINT_COLUMNS: &str = "id, user_id, subject, category, priority, status, \
     assigned_department, submitted_at, updated_at, resolved_at";

/// Complaint, feedback and profile reads for the report service.
#[derive(Clone)]
pub struct PgComplaintSource {
    pool: PgPool,
}

impl PgComplaintSource {
    /// Creates a new PgComplaintSource with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn feedback_for(
        &self,
        complaint_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<FeedbackEntry>>, sqlx::Error> {
        if complaint_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let timer = QueryTimer::new("list_feedback_for_complaints");
        let rows = sqlx::query_as::<_, FeedbackEntity>(
            r#"
            SELECT id, complaint_id, rating, comment, submitted_at
            FROM complaint_feedback
            WHERE complaint_id = ANY($1)
            ORDER BY submitted_at ASC
            "#,
        )
        .bind(complaint_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let mut grouped: HashMap<Uuid, Vec<FeedbackEntry>> = HashMap::new();
        for row in rows? {
            grouped.entry(row.complaint_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn attach_feedback(
        &self,
        rows: Vec<ComplaintEntity>,
    ) -> Result<Vec<ComplaintRecord>, sqlx::Error> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut feedback = self.feedback_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let entries = feedback.remove(&row.id).unwrap_or_default();
                row.into_domain(entries)
            })
            .collect())
    }
}

#[async_trait]
impl ComplaintSource for PgComplaintSource {
    async fn fetch_complaints(
        &self,
        query: &ComplaintQuery,
    ) -> Result<Vec<ComplaintRecord>, ReportError> {
        let direction = match query.order {
            SubmissionOrder::OldestFirst => "ASC",
            SubmissionOrder::NewestFirst => "DESC",
        };
        let sql = format!(
            r#"
            SELECT {COMPLAINT_COLUMNS}
            FROM complaints
            WHERE ($1::timestamptz IS NULL OR submitted_at >= $1)
              AND ($2::timestamptz IS NULL OR submitted_at <= $2)
              AND ($3::text[] IS NULL OR status = ANY($3))
              AND ($4::text IS NULL OR category = $4)
              AND ($5::text IS NULL OR assigned_department = $5)
              AND ($6::uuid IS NULL OR user_id = $6)
            ORDER BY submitted_at {direction}
            "#
        );

        let timer = QueryTimer::new("list_complaints");
        let rows = sqlx::query_as::<_, ComplaintEntity>(&sql)
            .bind(query.submitted_from)
            .bind(query.submitted_to)
            .bind(query.status_names())
            .bind(query.category.as_deref())
            .bind(query.department.as_deref())
            .bind(query.user_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        let rows = rows.map_err(ReportError::data_source)?;
        self.attach_feedback(rows)
            .await
            .map_err(ReportError::data_source)
    }

    async fn fetch_profiles(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProfileRecord>, ReportError> {
        let timer = QueryTimer::new("list_profiles");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, role, department, created_at
            FROM profiles
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(ReportError::data_source)
    }

    async fn fetch_feedback(
        &self,
        department: Option<&str>,
    ) -> Result<Vec<FeedbackRecord>, ReportError> {
        let timer = QueryTimer::new("list_feedback_with_complaints");
        let result = sqlx::query_as::<_, FeedbackWithComplaintEntity>(
            r#"
            SELECT f.id, f.complaint_id, f.rating, f.comment, f.submitted_at,
                   c.category, c.priority, c.assigned_department
            FROM complaint_feedback f
            JOIN complaints c ON c.id = f.complaint_id
            WHERE ($1::text IS NULL OR c.assigned_department = $1)
            ORDER BY f.submitted_at ASC
            "#,
        )
        .bind(department)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(ReportError::data_source)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ComplaintStatus,
        at: DateTime<Utc>,
    ) -> Result<ComplaintRecord, ReportError> {
        let sql = format!(
            r#"
            UPDATE complaints
            SET status = $2,
                updated_at = $3,
                resolved_at = CASE WHEN $2 = 'resolved' THEN $3 ELSE resolved_at END
            WHERE id = $1
            RETURNING {COMPLAINT_COLUMNS}
            "#
        );

        let timer = QueryTimer::new("update_complaint_status");
        let result = sqlx::query_as::<_, ComplaintEntity>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await;
        timer.record();

        let row = result
            .map_err(ReportError::data_source)?
            .ok_or_else(|| ReportError::NotFound(format!("Complaint {} not found", id)))?;

        let mut records = self
            .attach_feedback(vec![row])
            .await
            .map_err(ReportError::data_source)?;
        records
            .pop()
            .ok_or_else(|| ReportError::NotFound(format!("Complaint {} not found", id)))
    }
}
