// libs/shift-cell/src/services/roster.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AssignmentStatus, DoctorShiftAssignment, ShiftError};

/// Owns doctor shift assignments: reads for the availability/cancellation
/// paths and the single write this cell performs, the ACTIVE -> CANCELLED
/// compare-and-set. Assignment creation belongs to roster management and
/// never happens here.
pub struct ShiftRegistryService {
    supabase: SupabaseClient,
}

impl ShiftRegistryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_assignment(
        &self,
        assignment_id: Uuid,
        auth_token: &str,
    ) -> Result<DoctorShiftAssignment, ShiftError> {
        debug!("Fetching doctor shift assignment: {}", assignment_id);

        let path = format!("/rest/v1/doctor_shift_assignments?id=eq.{}", assignment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(ShiftError::AssignmentNotFound);
        }

        parse_assignment(result[0].clone())
    }

    /// ACTIVE assignments on `date` for the given doctors, ordered by
    /// (doctor_id, shift_template_id) so downstream results are deterministic.
    pub async fn active_assignments_for_date(
        &self,
        date: NaiveDate,
        doctor_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<DoctorShiftAssignment>, ShiftError> {
        if doctor_ids.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            "Fetching active assignments for {} doctors on {}",
            doctor_ids.len(),
            date
        );

        let id_list = doctor_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/doctor_shift_assignments?work_date=eq.{}&status=eq.{}&doctor_id=in.({})&order=doctor_id.asc,shift_template_id.asc",
            date,
            AssignmentStatus::Active,
            id_list
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result.into_iter().map(parse_assignment).collect()
    }

    /// Transitions the assignment ACTIVE -> CANCELLED as a compare-and-set:
    /// the status filter makes the PATCH a no-op unless the row is still
    /// ACTIVE, so two concurrent cancellations cannot both succeed.
    pub async fn cancel_if_active(
        &self,
        assignment_id: Uuid,
        reason: &str,
        auth_token: &str,
    ) -> Result<DoctorShiftAssignment, ShiftError> {
        debug!("Cancelling doctor shift assignment: {}", assignment_id);

        let path = format!(
            "/rest/v1/doctor_shift_assignments?id=eq.{}&status=eq.{}",
            assignment_id,
            AssignmentStatus::Active
        );
        let update_data = json!({
            "status": AssignmentStatus::Cancelled.to_string(),
            "cancel_reason": reason,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(headers),
            )
            .await?;

        if result.is_empty() {
            // Nothing matched: either the id is unknown or the row has
            // already left ACTIVE. Distinguish for the caller.
            return match self.get_assignment(assignment_id, auth_token).await {
                Ok(_) => Err(ShiftError::AssignmentNotActive),
                Err(e) => Err(e),
            };
        }

        let cancelled = parse_assignment(result[0].clone())?;
        info!(
            "Doctor shift assignment {} cancelled (doctor {}, {} on {})",
            cancelled.id, cancelled.doctor_id, cancelled.shift_template_id, cancelled.work_date
        );

        Ok(cancelled)
    }
}

fn parse_assignment(value: Value) -> Result<DoctorShiftAssignment, ShiftError> {
    serde_json::from_value(value)
        .map_err(|e| ShiftError::DatabaseError(format!("Failed to parse assignment: {}", e)))
}
