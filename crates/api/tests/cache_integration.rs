//! Integration tests for the cache service endpoint.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    admin_token, complaint, create_test_app, get_request, json_request, parse_response_body,
    token_for,
};
use domain::models::{ComplaintPriority, ComplaintStatus};
use domain::services::InMemoryComplaintSource;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_cache_requires_token() {
    let app = create_test_app(InMemoryComplaintSource::default());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            None,
            json!({"action": "get", "key": "reports"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cache_round_trip() {
    let app = create_test_app(InMemoryComplaintSource::default());
    let token = admin_token();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&token),
            json!({"action": "set", "key": "reports:period=month", "data": {"total": 3}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await, json!({"success": true}));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&token),
            json!({"action": "get", "key": "reports:period=month"}),
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["cached"], true);
    assert_eq!(body["data"]["total"], 3);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&token),
            json!({"action": "invalidate_endpoint", "key": "reports"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&token),
            json!({"action": "get", "key": "reports:period=month"}),
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["cached"], false);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_cache_get_config() {
    let app = create_test_app(InMemoryComplaintSource::default());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&admin_token()),
            json!({"action": "get_config", "key": "dashboard_stats"}),
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["config"]["ttl"], 300);
    assert_eq!(body["config"]["vary"], json!(["user_role", "department"]));
}

#[tokio::test]
async fn test_cache_unknown_action() {
    let app = create_test_app(InMemoryComplaintSource::default());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&admin_token()),
            json!({"action": "flush", "key": "reports"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unknown cache action: flush");
}

#[tokio::test]
async fn test_cache_denied_for_non_admins() {
    let app = create_test_app(InMemoryComplaintSource::default());

    for token in [
        token_for(Uuid::new_v4(), "citizen", None),
        token_for(Uuid::new_v4(), "authority", Some("Water")),
    ] {
        for action in ["get", "set", "invalidate", "invalidate_endpoint"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    Method::POST,
                    "/api/v1/cache",
                    Some(&token),
                    json!({"action": action, "key": "dashboard_stats", "data": {"n": 1}}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "action {}", action);

            let body = parse_response_body(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Admin access required");
        }
    }
}

#[tokio::test]
async fn test_citizen_cannot_overwrite_another_viewers_report() {
    let source = InMemoryComplaintSource::new(
        vec![complaint(
            ComplaintStatus::Pending,
            ComplaintPriority::Low,
            "Water",
            2,
        )],
        vec![],
    );
    let app = create_test_app(source);
    let admin_id = Uuid::new_v4();
    let admin = token_for(admin_id, "admin", None);
    let citizen = token_for(Uuid::new_v4(), "citizen", None);

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/reports/dashboard?period=month", &admin))
        .await
        .unwrap();
    assert_eq!(parse_response_body(response).await["totalComplaints"], 1);

    let admin_key = format!("dashboard_stats:user={}:period=month", admin_id);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&citizen),
            json!({"action": "set", "key": admin_key, "data": {"totalComplaints": 999}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/cache",
            Some(&citizen),
            json!({"action": "get", "key": admin_key}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(parse_response_body(response).await.get("data").is_none());

    let response = app
        .oneshot(get_request("/api/v1/reports/dashboard?period=month", &admin))
        .await
        .unwrap();
    assert_eq!(parse_response_body(response).await["totalComplaints"], 1);
}

#[tokio::test]
async fn test_cache_malformed_body_keeps_contract() {
    let app = create_test_app(InMemoryComplaintSource::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/cache")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()))
        .body(Body::from("{\"action\":"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}
