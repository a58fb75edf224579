//! Trend prediction route.

use axum::{extract::State, Json};
use domain::models::{PredictionQuery, PredictionResponse};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentViewer, QueryParams};

/// GET /api/v1/predict-trends
///
/// Forecasts over all complaints regardless of the caller's scope.
pub async fn predict_trends(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    QueryParams(query): QueryParams<PredictionQuery>,
) -> Result<Json<PredictionResponse>, ApiError> {
    query.validate()?;

    tracing::debug!(
        user_id = %viewer.user_id,
        period = %query.period(),
        periods = query.prediction_periods(),
        "Generating trend forecast"
    );

    let response = state.reports.trend_forecast(&query).await?;
    Ok(Json(response))
}
