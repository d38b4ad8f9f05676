// libs/appointment-cell/src/services/booking.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shift_cell::models::AssignmentStatus;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest};

/// Allocates appointment slots against doctor shifts.
///
/// The capacity check and the row write happen inside one SQL function call,
/// so concurrent allocations against the same (doctor, shift, date) tuple are
/// serialized by the storage layer rather than by this process.
pub struct BookingAllocatorService {
    supabase: SupabaseClient,
    config: AppConfig,
}

impl BookingAllocatorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    /// Books one appointment slot. The created appointment starts PENDING.
    pub async fn allocate(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Allocating appointment for patient {} with doctor {} on {}",
            request.patient_id, request.doctor_id, request.work_date
        );

        self.validate_allocation_request(&request)?;

        // The assignment must be ACTIVE right now; a stale availability read
        // is not trusted here.
        self.verify_active_assignment(
            request.doctor_id,
            request.shift_template_id,
            request.work_date,
            auth_token,
        )
        .await?;

        let capacity = self.config.capacity_for_shift(request.shift_template_id);
        let params = json!({
            "p_patient_id": request.patient_id,
            "p_doctor_id": request.doctor_id,
            "p_shift_template_id": request.shift_template_id,
            "p_work_date": request.work_date,
            "p_symptom_initial": request.symptom_initial,
            "p_capacity": capacity,
        });

        let result: Vec<Value> = self
            .supabase
            .request(
                Method::POST,
                "/rest/v1/rpc/allocate_shift_appointment",
                Some(auth_token),
                Some(params),
            )
            .await
            .map_err(|e| {
                let err: AppointmentError = e.into();
                if matches!(err, AppointmentError::SlotUnavailable) {
                    warn!(
                        "Slot exhausted for doctor {} shift {} on {}",
                        request.doctor_id, request.shift_template_id, request.work_date
                    );
                }
                err
            })?;

        let appointment = parse_appointment_row(result)?;
        info!("Appointment {} allocated", appointment.id);

        Ok(appointment)
    }

    /// Re-points an open appointment at a replacement doctor. Used only by
    /// the rescheduling engine; competes for capacity under the same
    /// storage-side discipline as `allocate`.
    pub async fn reassign(
        &self,
        appointment_id: Uuid,
        new_doctor_id: Uuid,
        shift_template_id: Uuid,
        work_date: NaiveDate,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Reassigning appointment {} to doctor {}",
            appointment_id, new_doctor_id
        );

        let capacity = self.config.capacity_for_shift(shift_template_id);
        let params = json!({
            "p_appointment_id": appointment_id,
            "p_new_doctor_id": new_doctor_id,
            "p_shift_template_id": shift_template_id,
            "p_work_date": work_date,
            "p_capacity": capacity,
        });

        let result: Vec<Value> = self
            .supabase
            .request(
                Method::POST,
                "/rest/v1/rpc/reassign_shift_appointment",
                Some(auth_token),
                Some(params),
            )
            .await?;

        parse_appointment_row(result)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// Open (PENDING/CONFIRMED) appointments bound to one (doctor, shift
    /// template, date) tuple, in creation order for deterministic processing.
    pub async fn open_appointments_for_tuple(
        &self,
        doctor_id: Uuid,
        shift_template_id: Uuid,
        work_date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&shift_template_id=eq.{}&work_date=eq.{}&status=in.({},{})&order=created_at.asc,id.asc",
            doctor_id,
            shift_template_id,
            work_date,
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
                })
            })
            .collect()
    }

    fn validate_allocation_request(
        &self,
        request: &BookAppointmentRequest,
    ) -> Result<(), AppointmentError> {
        if request.patient_id.is_nil() {
            return Err(AppointmentError::InvalidRequest(
                "patient_id is required".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        if request.work_date < today {
            return Err(AppointmentError::InvalidRequest(
                "Appointment date cannot be in the past".to_string(),
            ));
        }

        Ok(())
    }

    async fn verify_active_assignment(
        &self,
        doctor_id: Uuid,
        shift_template_id: Uuid,
        work_date: NaiveDate,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/doctor_shift_assignments?doctor_id=eq.{}&shift_template_id=eq.{}&work_date=eq.{}&status=eq.{}",
            doctor_id,
            shift_template_id,
            work_date,
            AssignmentStatus::Active,
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            warn!(
                "No active assignment for doctor {} shift {} on {}",
                doctor_id, shift_template_id, work_date
            );
            return Err(AppointmentError::SlotUnavailable);
        }

        Ok(())
    }
}

fn parse_appointment_row(rows: Vec<Value>) -> Result<Appointment, AppointmentError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppointmentError::DatabaseError("Empty allocation result".to_string()))?;

    serde_json::from_value(row)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}
