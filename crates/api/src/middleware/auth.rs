//! Viewer authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::{UserRole, Viewer};
use shared::jwt::{extract_user_id, JwtConfig};

use crate::app::AppState;
use crate::error::ApiError;

/// Bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing or invalid Authorization header".into()))
}

/// Validates a viewer token and builds the [`Viewer`] it describes.
pub fn viewer_from_token(jwt: &JwtConfig, token: &str) -> Result<Viewer, ApiError> {
    let claims = jwt.validate_token(token)?;
    let user_id = extract_user_id(&claims)?;
    let role = claims
        .role
        .parse::<UserRole>()
        .map_err(|_| ApiError::Unauthorized("Unknown role in token".into()))?;

    Ok(Viewer::new(user_id, role, claims.department))
}

/// Rejects requests without a valid viewer token; stores the [`Viewer`] in
/// request extensions otherwise.
pub async fn require_viewer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let viewer = match bearer_token(req.headers())
        .and_then(|token| viewer_from_token(&state.jwt, token))
    {
        Ok(viewer) => viewer,
        Err(e) => {
            tracing::debug!(error = %e, "Viewer authentication failed");
            return e.into_response();
        }
    };

    req.extensions_mut().insert(viewer);
    next.run(req).await
}
