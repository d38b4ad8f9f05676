// libs/shift-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::DbError;

// ==============================================================================
// REFERENCE DATA MODELS
// ==============================================================================

/// Named recurring time window, e.g. "Morning" 08:00-12:00. Immutable
/// reference data owned by roster management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub id: Uuid,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub specialty_id: Uuid,
    pub full_name: String,
}

// ==============================================================================
// DOCTOR SHIFT ASSIGNMENT MODELS
// ==============================================================================

/// Binding of one doctor to one shift template on one calendar date.
///
/// At most one ACTIVE assignment may exist per (doctor, template, date);
/// the storage layer enforces this with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorShiftAssignment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub shift_template_id: Uuid,
    pub work_date: NaiveDate,
    pub status: AssignmentStatus,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assignment lifecycle. ACTIVE is the only non-terminal state; there is no
/// way back from CANCELLED or REPLACED - reinstatement means a new row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Cancelled,
    Replaced,
}

impl AssignmentStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AssignmentStatus::Active)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Active => write!(f, "active"),
            AssignmentStatus::Cancelled => write!(f, "cancelled"),
            AssignmentStatus::Replaced => write!(f, "replaced"),
        }
    }
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// One bookable (doctor, shift template) pair on a given date with its
/// remaining capacity. Fully booked pairs are not reported here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorAvailability {
    pub doctor_id: Uuid,
    pub shift_template_id: Uuid,
    pub remaining_capacity: i32,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ShiftError {
    #[error("Specialty not found")]
    SpecialtyNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Shift template not found")]
    TemplateNotFound,

    #[error("Doctor shift assignment not found")]
    AssignmentNotFound,

    #[error("Doctor shift assignment is not active")]
    AssignmentNotActive,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for ShiftError {
    fn from(err: DbError) -> Self {
        ShiftError::DatabaseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_status_round_trips_through_stored_strings() {
        for (status, stored) in [
            (AssignmentStatus::Active, "\"active\""),
            (AssignmentStatus::Cancelled, "\"cancelled\""),
            (AssignmentStatus::Replaced, "\"replaced\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), stored);
            let parsed: AssignmentStatus = serde_json::from_str(stored).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn only_active_counts_as_active() {
        assert!(AssignmentStatus::Active.is_active());
        assert!(!AssignmentStatus::Cancelled.is_active());
        assert!(!AssignmentStatus::Replaced.is_active());
    }
}
