// libs/appointment-cell/src/services/cancellation.rs
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shift_cell::models::{DoctorAvailability, DoctorShiftAssignment};
use shift_cell::services::availability::AvailabilityService;
use shift_cell::services::directory::DirectoryService;
use shift_cell::services::roster::ShiftRegistryService;

use crate::models::{AppointmentError, CancellationPreview};
use crate::services::booking::BookingAllocatorService;

/// Computes the impact of cancelling a doctor shift assignment without
/// committing anything. The preview is advisory: the execution path in the
/// rescheduling engine re-derives everything from live state.
pub struct CancellationPlannerService {
    registry: ShiftRegistryService,
    directory: DirectoryService,
    availability: AvailabilityService,
    booking: BookingAllocatorService,
}

impl CancellationPlannerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            registry: ShiftRegistryService::new(config),
            directory: DirectoryService::new(config),
            availability: AvailabilityService::new(config),
            booking: BookingAllocatorService::new(config),
        }
    }

    /// Feasibility preview for cancelling an ACTIVE assignment. Repeated
    /// calls with unchanged state return identical results.
    pub async fn preview(
        &self,
        assignment_id: Uuid,
        auth_token: &str,
    ) -> Result<CancellationPreview, AppointmentError> {
        debug!("Previewing cancellation of assignment {}", assignment_id);

        let assignment = self.registry.get_assignment(assignment_id, auth_token).await?;
        if !assignment.status.is_active() {
            return Err(AppointmentError::InvalidState);
        }

        self.preview_for_assignment(&assignment, auth_token).await
    }

    /// Preview computation shared with the rescheduling engine, which calls
    /// it against an already-cancelled assignment.
    pub async fn preview_for_assignment(
        &self,
        assignment: &DoctorShiftAssignment,
        auth_token: &str,
    ) -> Result<CancellationPreview, AppointmentError> {
        let affected = self
            .booking
            .open_appointments_for_tuple(
                assignment.doctor_id,
                assignment.shift_template_id,
                assignment.work_date,
                auth_token,
            )
            .await?;

        let candidates = self.replacement_candidates(assignment, auth_token).await?;
        let preview = build_preview(assignment.id, affected.len() as i32, &candidates);

        info!(
            "Cancellation preview for {}: {} affected, auto-reschedule {}",
            assignment.id, preview.affected_appointment_count, preview.can_auto_reschedule
        );

        Ok(preview)
    }

    /// Same-specialty doctors with an ACTIVE shift on the same template and
    /// date, excluding the doctor being cancelled, in deterministic order.
    pub async fn replacement_candidates(
        &self,
        assignment: &DoctorShiftAssignment,
        auth_token: &str,
    ) -> Result<Vec<DoctorAvailability>, AppointmentError> {
        let doctor = self
            .directory
            .get_doctor(assignment.doctor_id, auth_token)
            .await?;

        let mut candidates = self
            .availability
            .resolve_excluding(
                doctor.specialty_id,
                assignment.work_date,
                Some(assignment.doctor_id),
                auth_token,
            )
            .await?;

        candidates.retain(|entry| entry.shift_template_id == assignment.shift_template_id);
        Ok(candidates)
    }
}

/// Pure feasibility computation. A replacement candidate must cover the whole
/// affected set on its own; the first sufficient doctor (candidates arrive
/// ordered by doctor id) wins.
pub fn build_preview(
    shift_assignment_id: Uuid,
    affected_appointment_count: i32,
    candidates: &[DoctorAvailability],
) -> CancellationPreview {
    if affected_appointment_count == 0 {
        // Nothing to move; cancellation is trivially safe.
        return CancellationPreview {
            shift_assignment_id,
            affected_appointment_count: 0,
            has_replacement_candidate: false,
            replacement_doctor_id: None,
            can_auto_reschedule: true,
            warning: None,
        };
    }

    let replacement = candidates
        .iter()
        .find(|candidate| candidate.remaining_capacity >= affected_appointment_count);

    match replacement {
        Some(candidate) => CancellationPreview {
            shift_assignment_id,
            affected_appointment_count,
            has_replacement_candidate: true,
            replacement_doctor_id: Some(candidate.doctor_id),
            can_auto_reschedule: true,
            warning: None,
        },
        None => CancellationPreview {
            shift_assignment_id,
            affected_appointment_count,
            has_replacement_candidate: false,
            replacement_doctor_id: None,
            can_auto_reschedule: false,
            warning: Some(format!(
                "{} appointment(s) cannot be auto-rescheduled and will require manual handling",
                affected_appointment_count
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(doctor_id: Uuid, template_id: Uuid, remaining: i32) -> DoctorAvailability {
        DoctorAvailability {
            doctor_id,
            shift_template_id: template_id,
            remaining_capacity: remaining,
        }
    }

    #[test]
    fn empty_impact_set_is_trivially_reschedulable() {
        let preview = build_preview(Uuid::new_v4(), 0, &[]);

        assert!(preview.can_auto_reschedule);
        assert!(!preview.has_replacement_candidate);
        assert_eq!(preview.replacement_doctor_id, None);
        assert_eq!(preview.warning, None);
    }

    #[test]
    fn first_candidate_with_sufficient_capacity_is_selected() {
        let assignment_id = Uuid::new_v4();
        let template = Uuid::new_v4();
        let small = candidate(Uuid::new_v4(), template, 1);
        let big = candidate(Uuid::new_v4(), template, 3);
        let bigger = candidate(Uuid::new_v4(), template, 5);

        let preview = build_preview(assignment_id, 2, &[small, big.clone(), bigger]);

        assert!(preview.can_auto_reschedule);
        assert!(preview.has_replacement_candidate);
        assert_eq!(preview.replacement_doctor_id, Some(big.doctor_id));
    }

    #[test]
    fn insufficient_candidates_produce_warning() {
        let template = Uuid::new_v4();
        let preview = build_preview(
            Uuid::new_v4(),
            4,
            &[candidate(Uuid::new_v4(), template, 2)],
        );

        assert!(!preview.can_auto_reschedule);
        assert!(!preview.has_replacement_candidate);
        assert_eq!(preview.replacement_doctor_id, None);
        assert!(preview.warning.as_deref().unwrap().contains("manual handling"));
    }

    #[test]
    fn no_candidates_produce_warning() {
        let preview = build_preview(Uuid::new_v4(), 1, &[]);

        assert!(!preview.can_auto_reschedule);
        assert!(preview.warning.is_some());
    }

    #[test]
    fn preview_is_deterministic() {
        let assignment_id = Uuid::new_v4();
        let template = Uuid::new_v4();
        let candidates = vec![candidate(Uuid::new_v4(), template, 2)];

        let first = build_preview(assignment_id, 1, &candidates);
        let second = build_preview(assignment_id, 1, &candidates);

        assert_eq!(first, second);
    }
}
