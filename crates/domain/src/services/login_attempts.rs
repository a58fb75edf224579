//! Fixed-window login attempt limiting.
//!
//! The first attempt for an identifier opens a window. Attempts are counted
//! and allowed until [`MAX_ATTEMPTS`] is reached; further attempts are
//! rejected until [`LOCKOUT_MINUTES`] after the window opened, when a new
//! window starts. Expired windows carry no state and are dropped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::ReportError;

pub const MAX_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 15;

fn lockout() -> Duration {
    Duration::minutes(LOCKOUT_MINUTES)
}

/// Stored window state for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptWindow {
    pub count: i32,
    pub window_start: DateTime<Utc>,
}

impl AttemptWindow {
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now - self.window_start >= lockout()
    }

    /// Whole minutes until the lockout lifts, rounded up. Zero when not locked.
    pub fn remaining_lockout_minutes(&self, now: DateTime<Utc>) -> i64 {
        if self.count < MAX_ATTEMPTS {
            return 0;
        }
        let remaining = (lockout() - (now - self.window_start)).num_seconds().max(0);
        (remaining + 59) / 60
    }
}

/// Outcome of an attempt check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDecision {
    pub allowed: bool,
    pub attempts: i32,
    pub remaining_attempts: i32,
    /// Minutes until the lockout lifts; zero when allowed.
    pub lockout_minutes: i64,
}

/// Applies one attempt to the stored window.
///
/// Returns the decision and the window state to store.
pub fn evaluate(
    current: Option<&AttemptWindow>,
    now: DateTime<Utc>,
) -> (AttemptDecision, AttemptWindow) {
    let next = match current {
        None => AttemptWindow::open(now),
        Some(window) if window.expired(now) => AttemptWindow::open(now),
        Some(window) if window.count >= MAX_ATTEMPTS => {
            let decision = AttemptDecision {
                allowed: false,
                attempts: window.count,
                remaining_attempts: 0,
                lockout_minutes: window.remaining_lockout_minutes(now),
            };
            return (decision, window.clone());
        }
        Some(window) => AttemptWindow {
            count: window.count + 1,
            window_start: window.window_start,
        },
    };

    let decision = AttemptDecision {
        allowed: true,
        attempts: next.count,
        remaining_attempts: (MAX_ATTEMPTS - next.count).max(0),
        lockout_minutes: 0,
    };
    (decision, next)
}

/// Shared attempt counter keyed by identifier (normally an e-mail address).
#[async_trait::async_trait]
pub trait AttemptLimiter: Send + Sync {
    /// Records an attempt and reports whether it may proceed.
    async fn check(&self, identifier: &str) -> Result<AttemptDecision, ReportError>;

    /// Minutes until `identifier` may try again; zero when not locked out.
    async fn remaining_lockout(&self, identifier: &str) -> Result<i64, ReportError>;

    /// Drop expired windows. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, ReportError>;
}

/// Process-local limiter.
#[derive(Debug, Default)]
pub struct InMemoryAttemptLimiter {
    windows: Mutex<HashMap<String, AttemptWindow>>,
}

impl InMemoryAttemptLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates an attempt at an explicit instant, dropping expired windows.
    pub async fn check_at(&self, identifier: &str, now: DateTime<Utc>) -> AttemptDecision {
        let mut windows = self.windows.lock().await;
        windows.retain(|_, window| !window.expired(now));
        let (decision, next) = evaluate(windows.get(identifier), now);
        windows.insert(identifier.to_string(), next);
        decision
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> u64 {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| !window.expired(now));
        (before - windows.len()) as u64
    }

    /// Number of identifiers with a live window.
    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.lock().await.is_empty()
    }

    pub async fn remaining_lockout_at(&self, identifier: &str, now: DateTime<Utc>) -> i64 {
        self.windows
            .lock()
            .await
            .get(identifier)
            .map(|w| w.remaining_lockout_minutes(now))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl AttemptLimiter for InMemoryAttemptLimiter {
    async fn check(&self, identifier: &str) -> Result<AttemptDecision, ReportError> {
        Ok(self.check_at(identifier, Utc::now()).await)
    }

    async fn remaining_lockout(&self, identifier: &str) -> Result<i64, ReportError> {
        Ok(self.remaining_lockout_at(identifier, Utc::now()).await)
    }

    async fn purge_expired(&self) -> Result<u64, ReportError> {
        Ok(self.purge_expired_at(Utc::now()).await)
    }
}
