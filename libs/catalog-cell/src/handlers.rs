// libs/catalog-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::CatalogError;
use crate::services::CatalogService;

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Backend(msg) => AppError::ExternalService(msg),
            CatalogError::ClinicNotFound(id) => {
                AppError::NotFound(format!("Clinic {} not found", id))
            }
            CatalogError::DoctorNotFound(id) => {
                AppError::NotFound(format!("Doctor {} not found", id))
            }
        }
    }
}

#[axum::debug_handler]
pub async fn list_clinics(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);
    let clinics = catalog.list_clinics().await?;

    Ok(Json(json!({
        "clinics": clinics,
        "total": clinics.len()
    })))
}

#[axum::debug_handler]
pub async fn list_all_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);
    let doctors = catalog.list_doctors(None).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn list_clinic_doctors(
    State(state): State<Arc<AppConfig>>,
    Path(clinic_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);
    let doctors = catalog.list_doctors(Some(&clinic_id)).await?;

    Ok(Json(json!({
        "clinic_id": clinic_id,
        "doctors": doctors,
        "total": doctors.len()
    })))
}
