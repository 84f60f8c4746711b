// libs/catalog-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn catalog_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/clinics", get(handlers::list_clinics))
        .route("/clinics/{clinic_id}/doctors", get(handlers::list_clinic_doctors))
        .route("/doctors", get(handlers::list_all_doctors))
        .with_state(state)
}
