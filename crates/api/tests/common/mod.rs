//! Common test utilities for integration tests.
//!
//! Routers are built on in-memory providers, so no database is needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use chrono::{Duration, Utc};
use domain::models::{
    ComplaintPriority, ComplaintRecord, ComplaintStatus, FeedbackEntry, ProfileRecord, UserRole,
};
use domain::services::InMemoryComplaintSource;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use serde_json::Value;
use shared::jwt::JwtConfig;
use std::sync::Arc;
use sulabh_api::{
    app::{create_app, Providers},
    config::Config,
};
use uuid::Uuid;

/// Test configuration: in-memory providers, rate limiting off.
pub fn test_config() -> Config {
    Config::load_for_test(&[("security.rate_limit_per_minute", "0")])
        .expect("Failed to load test config")
}

/// Router over `source` and an empty in-memory cache.
pub fn create_test_app(source: InMemoryComplaintSource) -> Router {
    create_test_app_with(test_config(), Providers::in_memory().with_source(Arc::new(source)))
}

pub fn create_test_app_with(config: Config, providers: Providers) -> Router {
    create_app(config, providers).expect("Failed to build app")
}

/// Viewer token signed with the test secret.
pub fn token_for(user_id: Uuid, role: &str, department: Option<&str>) -> String {
    let config = test_config();
    JwtConfig::new(&config.jwt.secret, 0)
        .expect("Invalid test secret")
        .issue_token(user_id, role, department, 3600)
        .expect("Failed to issue token")
}

pub fn admin_token() -> String {
    token_for(Uuid::new_v4(), "admin", None)
}

pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn parse_response_body(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap_or(Value::Null)
}

/// A complaint submitted `age_days` ago.
pub fn complaint(
    status: ComplaintStatus,
    priority: ComplaintPriority,
    department: &str,
    age_days: i64,
) -> ComplaintRecord {
    let submitted_at = Utc::now() - Duration::days(age_days);
    ComplaintRecord {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        subject: Sentence(3..6).fake(),
        category: "sanitation".to_string(),
        priority,
        status,
        assigned_department: Some(department.to_string()),
        submitted_at,
        updated_at: submitted_at,
        resolved_at: None,
        feedback: vec![],
    }
}

/// A complaint resolved `took_days` after submission.
pub fn resolved_complaint(department: &str, age_days: i64, took_days: i64) -> ComplaintRecord {
    let mut record = complaint(
        ComplaintStatus::Resolved,
        ComplaintPriority::Medium,
        department,
        age_days,
    );
    record.resolved_at = Some(record.submitted_at + Duration::days(took_days));
    record
}

pub fn with_rating(mut record: ComplaintRecord, rating: i32) -> ComplaintRecord {
    record.feedback.push(FeedbackEntry {
        id: Uuid::new_v4(),
        rating,
        comment: None,
        submitted_at: Utc::now(),
    });
    record
}

pub fn profile(role: UserRole, department: Option<&str>, age_days: i64) -> ProfileRecord {
    ProfileRecord {
        id: Uuid::new_v4(),
        role,
        department: department.map(str::to_string),
        created_at: Utc::now() - Duration::days(age_days),
    }
}
