// libs/shift-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn shift_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/availability", get(handlers::get_availability))
        .route("/shift-templates", get(handlers::list_shift_templates))
        .with_state(state)
}
