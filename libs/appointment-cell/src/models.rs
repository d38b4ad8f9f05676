// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::DbError;
use shift_cell::models::ShiftError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub shift_template_id: Uuid,
    pub work_date: NaiveDate,
    pub status: AppointmentStatus,
    pub symptom_initial: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// PENDING/CONFIRMED appointments occupy capacity and may be re-pointed
    /// by the rescheduling flow; COMPLETED/CANCELLED are settled.
    pub fn is_open(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub shift_template_id: Uuid,
    pub work_date: NaiveDate,
    pub symptom_initial: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelShiftRequest {
    pub cancel_reason: String,
    /// Set by retries of a cancellation that timed out after the shift was
    /// already cancelled: the engine then resumes rescheduling instead of
    /// failing on the state check. A plain repeat call leaves this false.
    #[serde(default)]
    pub resume_if_cancelled: bool,
}

// ==============================================================================
// CANCELLATION PREVIEW / OUTCOME MODELS
// ==============================================================================

/// Read-only feasibility report for cancelling one doctor shift assignment.
/// Never persisted; recomputed from live state on every call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancellationPreview {
    pub shift_assignment_id: Uuid,
    pub affected_appointment_count: i32,
    pub has_replacement_candidate: bool,
    pub replacement_doctor_id: Option<Uuid>,
    pub can_auto_reschedule: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleOutcome {
    pub shift_assignment_id: Uuid,
    pub total_appointments: i32,
    pub rescheduled_count: i32,
    pub failed_count: i32,
    pub results: Vec<AppointmentRescheduleResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRescheduleResult {
    pub appointment_id: Uuid,
    pub outcome: RescheduleResultKind,
    pub new_doctor_id: Option<Uuid>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RescheduleResultKind {
    Rescheduled,
    Failed,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Capacity exhausted or the target assignment is not ACTIVE at
    /// allocation time. Covers races decided at the storage layer.
    #[error("Appointment slot unavailable")]
    SlotUnavailable,

    #[error("Doctor shift assignment not found")]
    AssignmentNotFound,

    #[error("Doctor shift assignment is not in a cancellable state")]
    InvalidState,

    #[error("Specialty not found")]
    SpecialtyNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ShiftError> for AppointmentError {
    fn from(err: ShiftError) -> Self {
        match err {
            ShiftError::SpecialtyNotFound => AppointmentError::SpecialtyNotFound,
            ShiftError::DoctorNotFound => AppointmentError::DoctorNotFound,
            ShiftError::TemplateNotFound | ShiftError::AssignmentNotFound => {
                AppointmentError::AssignmentNotFound
            }
            ShiftError::AssignmentNotActive => AppointmentError::InvalidState,
            ShiftError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

impl From<DbError> for AppointmentError {
    fn from(err: DbError) -> Self {
        match err {
            // PostgREST reports a violated capacity constraint or a refused
            // RPC precondition as 409.
            DbError::Conflict(_) => AppointmentError::SlotUnavailable,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}
