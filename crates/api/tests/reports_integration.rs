//! Integration tests for the report endpoints.

mod common;

use axum::http::{header, StatusCode};
use common::{
    admin_token, complaint, create_test_app, get_request, parse_response_body, profile,
    resolved_complaint, token_for, with_rating,
};
use domain::models::{ComplaintPriority, ComplaintStatus, UserRole};
use domain::services::InMemoryComplaintSource;
use tower::ServiceExt;
use uuid::Uuid;

fn ten_complaints() -> InMemoryComplaintSource {
    let mut rows: Vec<_> = (0..6)
        .map(|_| resolved_complaint("Public Works", 3, 1))
        .collect();
    rows.extend(
        (0..4).map(|_| complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Public Works", 2)),
    );
    InMemoryComplaintSource::new(rows, vec![profile(UserRole::Citizen, None, 1)])
}

#[tokio::test]
async fn test_reports_require_token() {
    let app = create_test_app(InMemoryComplaintSource::default());

    let request = axum::http::Request::builder()
        .uri("/api/v1/reports/dashboard")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_dashboard_for_admin() {
    let app = create_test_app(ten_complaints());

    let response = app
        .oneshot(get_request("/api/v1/reports/dashboard?period=month", &admin_token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["totalComplaints"], 10);
    assert_eq!(body["pendingComplaints"], 4);
    assert_eq!(body["resolutionRate"], 60.0);
    assert_eq!(body["newRegistrations"], 1);
    assert_eq!(body["departmentPerformance"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dashboard_unknown_period_falls_back_to_month() {
    let app = create_test_app(ten_complaints());

    let response = app
        .oneshot(get_request("/api/v1/reports/dashboard?period=decade", &admin_token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["totalComplaints"], 10);
}

#[tokio::test]
async fn test_dashboard_scoped_for_authority() {
    let source = InMemoryComplaintSource::new(
        vec![
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 1),
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Roads", 1),
        ],
        vec![],
    );
    let app = create_test_app(source);
    let token = token_for(Uuid::new_v4(), "authority", Some("Water"));

    let response = app
        .oneshot(get_request("/api/v1/reports/dashboard", &token))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["totalComplaints"], 1);
    assert!(body["departmentPerformance"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_escalations_oldest_first() {
    let source = InMemoryComplaintSource::new(
        vec![
            complaint(ComplaintStatus::Pending, ComplaintPriority::Urgent, "Water", 10),
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 40),
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 2),
        ],
        vec![],
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(get_request("/api/v1/reports/escalations", &admin_token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["escalationReason"], "Complaint pending for more than 30 days");
    assert_eq!(
        rows[1]["escalationReason"],
        "Urgent complaint pending for more than 7 days"
    );
}

#[tokio::test]
async fn test_complaint_report_rejects_bad_status() {
    let app = create_test_app(ten_complaints());

    let response = app
        .oneshot(get_request(
            "/api/v1/reports/complaints?status=lost",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_complaint_report_filters_by_status() {
    let app = create_test_app(ten_complaints());

    let response = app
        .oneshot(get_request(
            "/api/v1/reports/complaints?status=resolved",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r["resolutionTime"] == 1));
}

#[tokio::test]
async fn test_citizen_sees_only_own_complaints() {
    let citizen = Uuid::new_v4();
    let mut own = complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 1);
    own.user_id = citizen;
    let source = InMemoryComplaintSource::new(
        vec![
            own,
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 1),
        ],
        vec![],
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(get_request(
            "/api/v1/reports/complaints",
            &token_for(citizen, "citizen", None),
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_feedback_summary() {
    let source = InMemoryComplaintSource::new(
        vec![
            with_rating(resolved_complaint("Water", 5, 1), 4),
            with_rating(resolved_complaint("Water", 5, 2), 2),
            with_rating(resolved_complaint("Roads", 5, 1), 5),
        ],
        vec![],
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(get_request(
            "/api/v1/reports/feedback?department=Water",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["totalFeedbacks"], 2);
    assert_eq!(body["averageRating"], 3.0);
}

#[tokio::test]
async fn test_user_activity() {
    let source = InMemoryComplaintSource::new(
        vec![],
        vec![
            profile(UserRole::Citizen, None, 400),
            profile(UserRole::Authority, Some("Water"), 400),
            profile(UserRole::Citizen, None, 400),
        ],
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(get_request("/api/v1/reports/user-activity", &admin_token()))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["totalUsers"], 3);
    assert_eq!(body["newUsersThisMonth"], 0);
    assert_eq!(body["usersByRole"]["citizen"], 2);
}

#[tokio::test]
async fn test_export_complaints_csv() {
    let app = create_test_app(ten_complaints());

    let response = app
        .oneshot(get_request(
            "/api/v1/reports/complaints/export?format=csv&status=pending",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"complaints_report_"));

    let body = String::from_utf8(common::body_bytes(response).await).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("ID,Subject,Category"));
}

#[tokio::test]
async fn test_export_escalations_html() {
    let source = InMemoryComplaintSource::new(
        vec![complaint(ComplaintStatus::Escalated, ComplaintPriority::Low, "Water", 1)],
        vec![],
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(get_request(
            "/api/v1/reports/escalations/export?format=html",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = String::from_utf8(common::body_bytes(response).await).unwrap();
    assert!(body.contains("SULABH ESCALATION Report"));
    assert!(body.contains("Manually escalated"));
}

#[tokio::test]
async fn test_export_rejects_unknown_kind_and_format() {
    let app = create_test_app(ten_complaints());

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/reports/users/export", &admin_token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_request(
            "/api/v1/reports/complaints/export?format=xlsx",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
