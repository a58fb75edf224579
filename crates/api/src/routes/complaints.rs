//! Complaint status routes.

use axum::{extract::State, Json};
use domain::models::{ComplaintRecord, ComplaintStatus};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentViewer, JsonBody, PathParams};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PATCH /api/v1/complaints/:id/status
///
/// Authorities and admins only. Every cached report is dropped afterwards.
pub async fn update_status(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    PathParams(id): PathParams<Uuid>,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> Result<Json<ComplaintRecord>, ApiError> {
    let status = request
        .status
        .parse::<ComplaintStatus>()
        .map_err(ApiError::Validation)?;

    let updated = state
        .reports
        .update_complaint_status(&viewer, id, status)
        .await?;
    Ok(Json(updated))
}
