// libs/appointment-cell/src/services/reschedule.rs
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shift_cell::models::{AssignmentStatus, DoctorAvailability, DoctorShiftAssignment, ShiftError};
use shift_cell::services::roster::ShiftRegistryService;

use crate::models::{
    Appointment, AppointmentError, AppointmentRescheduleResult, CancelShiftRequest,
    RescheduleOutcome, RescheduleResultKind,
};
use crate::services::booking::BookingAllocatorService;
use crate::services::cancellation::CancellationPlannerService;

/// Executes a shift cancellation: commits the ACTIVE -> CANCELLED transition,
/// then moves each affected appointment to a replacement doctor best-effort.
///
/// The cancellation always commits; per-appointment failures are reported in
/// the outcome, never rolled back.
pub struct ReschedulingEngineService {
    registry: ShiftRegistryService,
    planner: CancellationPlannerService,
    booking: BookingAllocatorService,
}

impl ReschedulingEngineService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            registry: ShiftRegistryService::new(config),
            planner: CancellationPlannerService::new(config),
            booking: BookingAllocatorService::new(config),
        }
    }

    pub async fn cancel_and_reschedule(
        &self,
        assignment_id: Uuid,
        request: CancelShiftRequest,
        auth_token: &str,
    ) -> Result<RescheduleOutcome, AppointmentError> {
        info!("Cancelling and rescheduling assignment {}", assignment_id);

        // Step 1: compare-and-set cancellation. No partial effects when the
        // assignment is not ACTIVE.
        let assignment = match self
            .registry
            .cancel_if_active(assignment_id, &request.cancel_reason, auth_token)
            .await
        {
            Ok(assignment) => assignment,
            Err(ShiftError::AssignmentNotActive) if request.resume_if_cancelled => {
                // A retry after a timed-out call: the cancellation already
                // committed, so pick up at the rescheduling step.
                let existing = self.registry.get_assignment(assignment_id, auth_token).await?;
                if existing.status != AssignmentStatus::Cancelled {
                    return Err(AppointmentError::InvalidState);
                }
                info!("Assignment {} already cancelled, resuming reschedule", assignment_id);
                existing
            }
            Err(e) => return Err(e.into()),
        };

        // Step 2: authoritative impact set, re-derived from live state. Only
        // still-unresolved appointments reference the cancelled tuple.
        let affected = self
            .booking
            .open_appointments_for_tuple(
                assignment.doctor_id,
                assignment.shift_template_id,
                assignment.work_date,
                auth_token,
            )
            .await?;

        if affected.is_empty() {
            info!("Assignment {} had no open appointments", assignment_id);
            return Ok(aggregate_outcome(assignment_id, vec![]));
        }

        let candidates = self
            .planner
            .replacement_candidates(&assignment, auth_token)
            .await?;

        debug!(
            "Rescheduling {} appointments across {} candidate doctors",
            affected.len(),
            candidates.len()
        );

        // Step 3: independent best-effort attempts; each reassignment goes
        // through the same storage-side capacity discipline as a booking.
        let attempts = affected
            .iter()
            .map(|appointment| self.reschedule_one(appointment, &candidates, &assignment, auth_token));
        let results = join_all(attempts).await;

        let outcome = aggregate_outcome(assignment_id, results);
        info!(
            "Assignment {} cancelled: {}/{} appointments rescheduled",
            assignment_id, outcome.rescheduled_count, outcome.total_appointments
        );

        Ok(outcome)
    }

    /// Tries each candidate doctor in order until one accepts the
    /// appointment. Capacity races with concurrent bookers surface as
    /// `SlotUnavailable` and simply move on to the next candidate.
    async fn reschedule_one(
        &self,
        appointment: &Appointment,
        candidates: &[DoctorAvailability],
        assignment: &DoctorShiftAssignment,
        auth_token: &str,
    ) -> AppointmentRescheduleResult {
        for candidate in candidates {
            match self
                .booking
                .reassign(
                    appointment.id,
                    candidate.doctor_id,
                    assignment.shift_template_id,
                    assignment.work_date,
                    auth_token,
                )
                .await
            {
                Ok(updated) => {
                    debug!(
                        "Appointment {} moved to doctor {}",
                        appointment.id, updated.doctor_id
                    );
                    return AppointmentRescheduleResult {
                        appointment_id: appointment.id,
                        outcome: RescheduleResultKind::Rescheduled,
                        new_doctor_id: Some(updated.doctor_id),
                        reason: None,
                    };
                }
                Err(AppointmentError::SlotUnavailable) => continue,
                Err(e) => {
                    warn!("Reschedule of appointment {} failed: {}", appointment.id, e);
                    return AppointmentRescheduleResult {
                        appointment_id: appointment.id,
                        outcome: RescheduleResultKind::Failed,
                        new_doctor_id: None,
                        reason: Some(e.to_string()),
                    };
                }
            }
        }

        AppointmentRescheduleResult {
            appointment_id: appointment.id,
            outcome: RescheduleResultKind::Failed,
            new_doctor_id: None,
            reason: Some("No replacement doctor with remaining capacity".to_string()),
        }
    }
}

/// Folds per-appointment results into the aggregate tally. Holds the
/// conservation law: rescheduled + failed = total.
pub fn aggregate_outcome(
    shift_assignment_id: Uuid,
    results: Vec<AppointmentRescheduleResult>,
) -> RescheduleOutcome {
    let rescheduled_count = results
        .iter()
        .filter(|r| r.outcome == RescheduleResultKind::Rescheduled)
        .count() as i32;
    let failed_count = results
        .iter()
        .filter(|r| r.outcome == RescheduleResultKind::Failed)
        .count() as i32;

    RescheduleOutcome {
        shift_assignment_id,
        total_appointments: results.len() as i32,
        rescheduled_count,
        failed_count,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(kind: RescheduleResultKind) -> AppointmentRescheduleResult {
        AppointmentRescheduleResult {
            appointment_id: Uuid::new_v4(),
            outcome: kind,
            new_doctor_id: matches!(kind, RescheduleResultKind::Rescheduled)
                .then(Uuid::new_v4),
            reason: matches!(kind, RescheduleResultKind::Failed)
                .then(|| "no capacity".to_string()),
        }
    }

    #[test]
    fn aggregate_counts_conserve_totals() {
        let results = vec![
            result(RescheduleResultKind::Rescheduled),
            result(RescheduleResultKind::Failed),
            result(RescheduleResultKind::Rescheduled),
        ];

        let outcome = aggregate_outcome(Uuid::new_v4(), results);

        assert_eq!(outcome.total_appointments, 3);
        assert_eq!(outcome.rescheduled_count, 2);
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(
            outcome.rescheduled_count + outcome.failed_count,
            outcome.total_appointments
        );
    }

    #[test]
    fn empty_impact_set_yields_zero_outcome() {
        let outcome = aggregate_outcome(Uuid::new_v4(), vec![]);

        assert_eq!(outcome.total_appointments, 0);
        assert_eq!(outcome.rescheduled_count, 0);
        assert_eq!(outcome.failed_count, 0);
        assert!(outcome.results.is_empty());
    }
}
