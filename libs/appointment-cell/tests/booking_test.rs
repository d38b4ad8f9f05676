// libs/appointment-cell/tests/booking_test.rs

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, BookAppointmentRequest,
};
use appointment_cell::services::booking::BookingAllocatorService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const TOKEN: &str = "test-token";

fn future_date() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(7)
}

fn book_request(doctor_id: Uuid, shift_template_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id: Uuid::new_v4(),
        doctor_id,
        shift_template_id,
        work_date: future_date(),
        symptom_initial: Some("persistent cough".to_string()),
    }
}

async fn mount_active_assignment(server: &MockServer, doctor_id: Uuid, template_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_shift_assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::assignment_response(
                Uuid::new_v4(),
                doctor_id,
                template_id,
                future_date(),
                "active"
            )
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn allocate_creates_a_pending_appointment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    let doctor_id = Uuid::new_v4();
    let template_id = Uuid::new_v4();
    let request = book_request(doctor_id, template_id);
    let appointment_id = Uuid::new_v4();

    mount_active_assignment(&mock_server, doctor_id, template_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/allocate_shift_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                appointment_id,
                request.patient_id,
                doctor_id,
                template_id,
                request.work_date,
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let allocator = BookingAllocatorService::new(&config);
    let appointment = allocator.allocate(request, TOKEN).await.unwrap();

    assert_eq!(appointment.id, appointment_id);
    assert_eq!(appointment.doctor_id, doctor_id);
    assert_eq!(appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn allocate_rejects_past_dates_before_touching_storage() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    let mut request = book_request(Uuid::new_v4(), Uuid::new_v4());
    request.work_date = Utc::now().date_naive() - Duration::days(1);

    let allocator = BookingAllocatorService::new(&config);
    let result = allocator.allocate(request, TOKEN).await;

    assert_matches!(result, Err(AppointmentError::InvalidRequest(_)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn allocate_rejects_nil_patient_id() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    let mut request = book_request(Uuid::new_v4(), Uuid::new_v4());
    request.patient_id = Uuid::nil();

    let allocator = BookingAllocatorService::new(&config);
    let result = allocator.allocate(request, TOKEN).await;

    assert_matches!(result, Err(AppointmentError::InvalidRequest(_)));
}

#[tokio::test]
async fn allocate_without_active_assignment_is_unavailable() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_shift_assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let allocator = BookingAllocatorService::new(&config);
    let result = allocator
        .allocate(book_request(Uuid::new_v4(), Uuid::new_v4()), TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::SlotUnavailable));
}

#[tokio::test]
async fn allocate_on_exhausted_capacity_is_unavailable() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    let doctor_id = Uuid::new_v4();
    let template_id = Uuid::new_v4();

    mount_active_assignment(&mock_server, doctor_id, template_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/allocate_shift_appointment"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "shift capacity exhausted"})),
        )
        .mount(&mock_server)
        .await;

    let allocator = BookingAllocatorService::new(&config);
    let result = allocator
        .allocate(book_request(doctor_id, template_id), TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::SlotUnavailable));
}

// Two concurrent allocations racing for the last slot: the storage layer
// accepts exactly one and refuses the other with a conflict.
#[tokio::test]
async fn concurrent_allocations_for_last_slot_admit_exactly_one() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    let doctor_id = Uuid::new_v4();
    let template_id = Uuid::new_v4();
    let request_a = book_request(doctor_id, template_id);
    let request_b = book_request(doctor_id, template_id);

    mount_active_assignment(&mock_server, doctor_id, template_id).await;

    // First RPC call wins the slot; every later one gets a conflict.
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/allocate_shift_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                Uuid::new_v4(),
                request_a.patient_id,
                doctor_id,
                template_id,
                request_a.work_date,
                "pending"
            )
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/allocate_shift_appointment"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "shift capacity exhausted"})),
        )
        .mount(&mock_server)
        .await;

    let allocator = BookingAllocatorService::new(&config);
    let (first, second) = tokio::join!(
        allocator.allocate(request_a, TOKEN),
        allocator.allocate(request_b, TOKEN),
    );

    let outcomes = [first, second];
    let won = outcomes.iter().filter(|r| r.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|r| matches!(r, Err(AppointmentError::SlotUnavailable)))
        .count();

    assert_eq!(won, 1);
    assert_eq!(refused, 1);
}

#[tokio::test]
async fn get_appointment_unknown_id_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let allocator = BookingAllocatorService::new(&config);
    let result = allocator.get_appointment(Uuid::new_v4(), TOKEN).await;

    assert_matches!(result, Err(AppointmentError::NotFound));
}
