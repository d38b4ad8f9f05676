use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, doctor_shift_routes};
use shared_config::AppConfig;
use shift_cell::router::shift_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic shift scheduling API is running!" }))
        .merge(shift_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/doctor-shifts", doctor_shift_routes(state))
}
