// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::state::AppointmentState;

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", delete(handlers::cancel_appointment))
        .route("/slots", get(handlers::get_slots))
        .route("/availability", get(handlers::get_availability))
        .route("/users/{user_id}", get(handlers::get_user_appointments))
        .with_state(state)
}
