// libs/shift-cell/src/services/availability.rs
use std::collections::HashMap;

use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{DoctorAvailability, DoctorShiftAssignment, ShiftError};
use crate::services::directory::DirectoryService;
use crate::services::roster::ShiftRegistryService;

/// Row shape for the booked-slot count query. Only the tuple key is selected;
/// the count is derived client-side per (doctor, template).
#[derive(Debug, Deserialize)]
struct BookedSlotRow {
    doctor_id: Uuid,
    shift_template_id: Uuid,
}

/// Resolves which doctors of a specialty can take new appointments on a date.
///
/// The result is advisory: capacity is re-checked at the storage layer when
/// an appointment is actually allocated.
pub struct AvailabilityService {
    supabase: SupabaseClient,
    directory: DirectoryService,
    registry: ShiftRegistryService,
    config: AppConfig,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            directory: DirectoryService::new(config),
            registry: ShiftRegistryService::new(config),
            config: config.clone(),
        }
    }

    /// Doctors of `specialty_id` with an ACTIVE shift on `date` and remaining
    /// capacity > 0. An empty list for a valid specialty is a normal outcome.
    pub async fn resolve(
        &self,
        specialty_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<DoctorAvailability>, ShiftError> {
        self.resolve_excluding(specialty_id, date, None, auth_token)
            .await
    }

    /// Same as [`resolve`](Self::resolve) with one doctor removed from the
    /// candidate set; the cancellation flow uses this to look past the doctor
    /// whose shift is being cancelled.
    pub async fn resolve_excluding(
        &self,
        specialty_id: Uuid,
        date: NaiveDate,
        exclude_doctor: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<DoctorAvailability>, ShiftError> {
        debug!(
            "Resolving availability for specialty {} on {} (excluding {:?})",
            specialty_id, date, exclude_doctor
        );

        // A missing specialty is an error; a specialty with no doctors is not.
        self.directory.get_specialty(specialty_id, auth_token).await?;

        let doctors = self
            .directory
            .list_doctors_by_specialty(specialty_id, auth_token)
            .await?;

        let doctor_ids: Vec<Uuid> = doctors
            .into_iter()
            .map(|doctor| doctor.id)
            .filter(|id| Some(*id) != exclude_doctor)
            .collect();

        if doctor_ids.is_empty() {
            return Ok(vec![]);
        }

        let assignments = self
            .registry
            .active_assignments_for_date(date, &doctor_ids, auth_token)
            .await?;

        if assignments.is_empty() {
            return Ok(vec![]);
        }

        let booked = self
            .booked_slots_for_date(date, &doctor_ids, auth_token)
            .await?;

        let mut availability = tally_remaining_capacity(&assignments, &booked, |template_id| {
            self.config.capacity_for_shift(template_id)
        });
        availability.sort_by_key(|entry| (entry.doctor_id, entry.shift_template_id));

        debug!("Resolved {} available doctor-shift pairs", availability.len());
        Ok(availability)
    }

    /// PENDING/CONFIRMED appointments on `date` for the given doctors, as
    /// tuple keys to be counted against capacity.
    async fn booked_slots_for_date(
        &self,
        date: NaiveDate,
        doctor_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<BookedSlotRow>, ShiftError> {
        let id_list = doctor_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/appointments?select=doctor_id,shift_template_id&work_date=eq.{}&status=in.(pending,confirmed)&doctor_id=in.({})",
            date, id_list
        );

        let rows: Vec<BookedSlotRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(rows)
    }
}

/// Remaining capacity per ACTIVE assignment; fully booked (or overbooked)
/// tuples are dropped.
fn tally_remaining_capacity(
    assignments: &[DoctorShiftAssignment],
    booked: &[BookedSlotRow],
    capacity_for: impl Fn(Uuid) -> i32,
) -> Vec<DoctorAvailability> {
    let mut booked_counts: HashMap<(Uuid, Uuid), i32> = HashMap::new();
    for row in booked {
        *booked_counts
            .entry((row.doctor_id, row.shift_template_id))
            .or_insert(0) += 1;
    }

    assignments
        .iter()
        .filter_map(|assignment| {
            let key = (assignment.doctor_id, assignment.shift_template_id);
            let capacity = capacity_for(assignment.shift_template_id);
            let remaining = capacity - booked_counts.get(&key).copied().unwrap_or(0);

            (remaining > 0).then_some(DoctorAvailability {
                doctor_id: assignment.doctor_id,
                shift_template_id: assignment.shift_template_id,
                remaining_capacity: remaining,
            })
        })
        .collect()
}
