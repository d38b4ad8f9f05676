// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;
use shift_cell::services::roster::ShiftRegistryService;

use crate::models::{AppointmentError, BookAppointmentRequest, CancelShiftRequest};
use crate::services::booking::BookingAllocatorService;
use crate::services::cancellation::CancellationPlannerService;
use crate::services::reschedule::ReschedulingEngineService;

fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::AssignmentNotFound => {
            AppError::NotFound("Doctor shift assignment not found".to_string())
        }
        AppointmentError::SpecialtyNotFound => AppError::NotFound("Specialty not found".to_string()),
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::InvalidRequest(msg) => AppError::BadRequest(msg),
        AppointmentError::SlotUnavailable => {
            AppError::Conflict("Appointment slot no longer available".to_string())
        }
        AppointmentError::InvalidState => {
            AppError::Conflict("Doctor shift assignment is not active".to_string())
        }
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// POST /appointments
#[axum::debug_handler]
pub async fn allocate_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let allocator = BookingAllocatorService::new(&state);

    let appointment = allocator
        .allocate(request, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

/// GET /appointments/{appointment_id}
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let allocator = BookingAllocatorService::new(&state);

    let appointment = allocator
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

/// GET /doctor-shifts/{assignment_id}
#[axum::debug_handler]
pub async fn get_doctor_shift(
    State(state): State<Arc<AppConfig>>,
    Path(assignment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let registry = ShiftRegistryService::new(&state);

    let assignment = registry
        .get_assignment(assignment_id, token)
        .await
        .map_err(|e| map_appointment_error(e.into()))?;

    Ok(Json(json!(assignment)))
}

/// GET /doctor-shifts/{assignment_id}/reschedule-preview
#[axum::debug_handler]
pub async fn reschedule_preview(
    State(state): State<Arc<AppConfig>>,
    Path(assignment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let planner = CancellationPlannerService::new(&state);

    let preview = planner
        .preview(assignment_id, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(preview)))
}

/// POST /doctor-shifts/{assignment_id}/cancel-and-reschedule
///
/// Always returns 200 once the cancellation commits; appointments that could
/// not be moved are reported in the payload, not as a request-level error.
#[axum::debug_handler]
pub async fn cancel_and_reschedule(
    State(state): State<Arc<AppConfig>>,
    Path(assignment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CancelShiftRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let engine = ReschedulingEngineService::new(&state);

    let outcome = engine
        .cancel_and_reschedule(assignment_id, request, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "outcome": outcome,
        "message": if outcome.failed_count > 0 {
            "Shift cancelled; some appointments require manual handling"
        } else {
            "Shift cancelled and all appointments rescheduled"
        }
    })))
}
