//! Cache service route.
//!
//! Exposes a cache store over the `{action, key, data}` contract used by
//! [`crate::services::HttpCacheClient`]. Entries hold other viewers' scoped
//! reports, so only admin tokens are served.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use domain::models::cache::endpoint_config;
use domain::models::{CacheAction, CacheRequest, CacheResponse};
use domain::services::CacheStore;

use crate::app::AppState;
use crate::extractors::CurrentViewer;

/// Runs one cache request against `store`.
///
/// Unknown actions, missing keys and `set` without data are 400s. Backend
/// failures are 500s. Every response carries the `success` flag.
pub async fn dispatch(store: &dyn CacheStore, request: CacheRequest) -> (StatusCode, CacheResponse) {
    let action = match request.action.parse::<CacheAction>() {
        Ok(action) => action,
        Err(e) => return (StatusCode::BAD_REQUEST, CacheResponse::failure(e)),
    };

    let Some(key) = request.key.filter(|k| !k.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            CacheResponse::failure(format!("Missing key for action {}", action.as_str())),
        );
    };

    let result = match action {
        CacheAction::GetConfig => {
            return match endpoint_config(&key) {
                Some(config) => (StatusCode::OK, CacheResponse::config(config)),
                None => (
                    StatusCode::BAD_REQUEST,
                    CacheResponse::failure(format!("Unknown endpoint: {}", key)),
                ),
            };
        }
        CacheAction::Get => store.get(&key).await.map(CacheResponse::lookup),
        CacheAction::Set => match request.data.filter(|d| !d.is_null()) {
            Some(data) => store.set(&key, data).await.map(|_| CacheResponse::ok()),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    CacheResponse::failure("Missing data for action set"),
                )
            }
        },
        CacheAction::Invalidate => store.invalidate(&key).await.map(|_| CacheResponse::ok()),
        CacheAction::InvalidateEndpoint => store
            .invalidate_endpoint(&key)
            .await
            .map(|_| CacheResponse::ok()),
    };

    match result {
        Ok(response) => (StatusCode::OK, response),
        Err(e) => {
            tracing::error!(action = action.as_str(), key = %key, error = %e, "Cache request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, CacheResponse::failure(e.to_string()))
        }
    }
}

/// POST /api/v1/cache
///
/// Admins only. Failures keep the `{success: false, error}` shape.
pub async fn handle(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    body: Result<Json<CacheRequest>, JsonRejection>,
) -> (StatusCode, Json<CacheResponse>) {
    if !viewer.is_admin() {
        tracing::warn!(user_id = %viewer.user_id, role = %viewer.role, "Cache access denied");
        return (
            StatusCode::FORBIDDEN,
            Json(CacheResponse::failure("Admin access required")),
        );
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CacheResponse::failure(rejection.body_text())),
            )
        }
    };

    let (status, response) = dispatch(state.reports.cache().as_ref(), request).await;
    (status, Json(response))
}
