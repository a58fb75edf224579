//! Integration tests for the trend prediction endpoint.

mod common;

use axum::http::{header, StatusCode};
use common::{admin_token, complaint, create_test_app, get_request, parse_response_body};
use domain::models::{ComplaintPriority, ComplaintStatus};
use domain::services::InMemoryComplaintSource;
use tower::ServiceExt;

#[tokio::test]
async fn test_prediction_defaults() {
    let app = create_test_app(InMemoryComplaintSource::default());

    let response = app
        .oneshot(get_request("/api/v1/predict-trends", &admin_token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["metadata"]["period"], "month");
    assert_eq!(body["metadata"]["predictionMonths"], 3);
    assert!(body["historical"].as_array().unwrap().is_empty());
    assert!(body["predictions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_prediction_months_out_of_range() {
    let app = create_test_app(InMemoryComplaintSource::default());

    for months in ["0", "25"] {
        let response = app
            .clone()
            .oneshot(get_request(
                &format!("/api/v1/predict-trends?months={}", months),
                &admin_token(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = parse_response_body(response).await;
        assert_eq!(body["message"], "months must be between 1 and 24");
    }
}

#[tokio::test]
async fn test_prediction_months_not_a_number() {
    let app = create_test_app(InMemoryComplaintSource::default());

    for months in ["abc", "-1", "2.5"] {
        let response = app
            .clone()
            .oneshot(get_request(
                &format!("/api/v1/predict-trends?months={}", months),
                &admin_token(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "months={}", months);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));

        let body = parse_response_body(response).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to deserialize query string"));
    }
}

#[tokio::test]
async fn test_predictions_flagged() {
    let source = InMemoryComplaintSource::new(
        vec![
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 400),
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 200),
            complaint(ComplaintStatus::Pending, ComplaintPriority::Low, "Water", 1),
        ],
        vec![],
    );
    let app = create_test_app(source);

    let response = app
        .oneshot(get_request(
            "/api/v1/predict-trends?period=year&months=2",
            &admin_token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 2);
    assert!(predictions.iter().all(|p| p["isPrediction"] == true));
}
