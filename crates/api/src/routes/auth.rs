//! Login attempt limiting route.
//!
//! Called by the sign-in flow before credentials are checked, so it is
//! public.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{JsonBody, QueryParams};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginAttemptRequest {
    #[validate(email(message = "Invalid email format"))]
    pub identifier: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockoutResponse {
    pub locked: bool,
    pub lockout_minutes: i64,
}

impl LoginAttemptRequest {
    /// Trimmed, lower-cased and validated.
    fn normalized(self) -> Result<Self, ApiError> {
        let request = Self {
            identifier: self.identifier.trim().to_lowercase(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// POST /api/v1/auth/login-attempts
///
/// Records one attempt. 200 with the decision while allowed, 429 with the
/// decision and `Retry-After` once locked out.
pub async fn record_login_attempt(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginAttemptRequest>,
) -> Result<Response, ApiError> {
    let request = request.normalized()?;
    let decision = state.attempts.check(&request.identifier).await?;

    if decision.allowed {
        return Ok((StatusCode::OK, Json(decision)).into_response());
    }

    tracing::warn!(
        attempts = decision.attempts,
        lockout_minutes = decision.lockout_minutes,
        "Login attempts locked out"
    );

    let retry_after = (decision.lockout_minutes.max(1) * 60).to_string();
    Ok((
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after)],
        Json(decision),
    )
        .into_response())
}

/// GET /api/v1/auth/login-attempts/lockout?identifier=
///
/// Minutes until the identifier may try again, without recording an attempt.
pub async fn lockout_status(
    State(state): State<AppState>,
    QueryParams(request): QueryParams<LoginAttemptRequest>,
) -> Result<Json<LockoutResponse>, ApiError> {
    let request = request.normalized()?;
    let minutes = state
        .attempts
        .remaining_lockout(&request.identifier)
        .await?;

    Ok(Json(LockoutResponse {
        locked: minutes > 0,
        lockout_minutes: minutes,
    }))
}
