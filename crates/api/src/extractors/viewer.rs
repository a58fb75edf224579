//! Authenticated viewer extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::Viewer;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::{bearer_token, viewer_from_token};

/// The viewer a request is made on behalf of.
///
/// Uses the viewer stored by [`crate::middleware::require_viewer`] when
/// present, otherwise validates the Bearer token itself.
#[derive(Debug, Clone)]
pub struct CurrentViewer(pub Viewer);

#[async_trait]
impl FromRequestParts<AppState> for CurrentViewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(viewer) = parts.extensions.get::<Viewer>() {
            return Ok(CurrentViewer(viewer.clone()));
        }

        let token = bearer_token(&parts.headers)?;
        viewer_from_token(&state.jwt, token).map(CurrentViewer)
    }
}
