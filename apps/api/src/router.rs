use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, AppointmentState};
use catalog_cell::catalog_routes;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let appointments = Arc::new(AppointmentState::from_config(Arc::clone(&config)));

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/appointments", appointment_routes(appointments))
        .nest("/catalog", catalog_routes(config))
}
