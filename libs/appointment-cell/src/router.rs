// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::allocate_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .with_state(state)
}

pub fn doctor_shift_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{assignment_id}", get(handlers::get_doctor_shift))
        .route(
            "/{assignment_id}/reschedule-preview",
            get(handlers::reschedule_preview),
        )
        .route(
            "/{assignment_id}/cancel-and-reschedule",
            post(handlers::cancel_and_reschedule),
        )
        .with_state(state)
}
