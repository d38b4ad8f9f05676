// libs/shift-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::ShiftError;
use crate::services::availability::AvailabilityService;
use crate::services::catalog::ShiftCatalogService;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub specialty_id: Uuid,
    pub date: NaiveDate,
}

fn map_shift_error(err: ShiftError) -> AppError {
    match err {
        ShiftError::SpecialtyNotFound => AppError::NotFound("Specialty not found".to_string()),
        ShiftError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        ShiftError::TemplateNotFound => AppError::NotFound("Shift template not found".to_string()),
        ShiftError::AssignmentNotFound => {
            AppError::NotFound("Doctor shift assignment not found".to_string())
        }
        ShiftError::AssignmentNotActive => {
            AppError::Conflict("Doctor shift assignment is not active".to_string())
        }
        ShiftError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// GET /availability?specialty_id=&date=
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let availability = availability_service
        .resolve(query.specialty_id, query.date, token)
        .await
        .map_err(map_shift_error)?;

    Ok(Json(json!({
        "specialty_id": query.specialty_id,
        "date": query.date,
        "availability": availability,
    })))
}

/// GET /shift-templates
#[axum::debug_handler]
pub async fn list_shift_templates(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let catalog = ShiftCatalogService::new(&state);

    let templates = catalog.list_templates(token).await.map_err(map_shift_error)?;

    Ok(Json(json!({ "shift_templates": templates })))
}
