// libs/shift-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};
use shift_cell::router::shift_routes;

fn create_test_app(config: &AppConfig) -> Router {
    shift_routes(Arc::new(config.clone()))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn availability_endpoint_returns_doctor_shift_pairs() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    let specialty_id = Uuid::new_v4();
    let template_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::specialty_response(specialty_id, "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(doctor_id, specialty_id, "Dr. Amara")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_shift_assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::assignment_response(
                Uuid::new_v4(),
                doctor_id,
                template_id,
                date,
                "active"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app
        .oneshot(get_request(&format!(
            "/availability?specialty_id={}&date={}",
            specialty_id, date
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(payload["specialty_id"], json!(specialty_id));
    assert_eq!(payload["availability"][0]["doctor_id"], json!(doctor_id));
    assert_eq!(payload["availability"][0]["remaining_capacity"], json!(4));
}

#[tokio::test]
async fn availability_endpoint_unknown_specialty_is_404() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app
        .oneshot(get_request(&format!(
            "/availability?specialty_id={}&date=2026-09-14",
            Uuid::new_v4()
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shift_templates_endpoint_lists_catalog() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/shift_templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::shift_template_response(
                Uuid::new_v4(),
                "morning",
                "08:00:00",
                "12:00:00"
            ),
            MockSupabaseResponses::shift_template_response(
                Uuid::new_v4(),
                "afternoon",
                "13:00:00",
                "17:00:00"
            ),
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app.oneshot(get_request("/shift-templates")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(payload["shift_templates"].as_array().unwrap().len(), 2);
}
