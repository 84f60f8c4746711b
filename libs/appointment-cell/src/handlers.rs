// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use catalog_cell::CatalogService;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::SheetValue;

use crate::models::{
    AppointmentError, AvailabilityQuery, BookAppointmentRequest, BookingPayload, BookingRequest,
    CancelOutcome,
};
use crate::services::{
    generate_slots, normalize_date, resolve_availability, AppointmentListingService, BookingGuard,
};
use crate::services::normalizer::is_canonical_date;
use crate::state::AppointmentState;

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::SlotConflict { ref occupied, .. } => AppError::SlotConflict {
                message: e.to_string(),
                occupied: occupied.iter().cloned().collect(),
            },
            AppointmentError::RepositoryFailure(msg) => AppError::Database(msg),
            AppointmentError::ParseFailure { .. } => AppError::BadRequest(e.to_string()),
            AppointmentError::InvalidRequest(msg) => AppError::ValidationError(msg),
        }
    }
}

// ==============================================================================
// SLOT & AVAILABILITY HANDLERS
// ==============================================================================

pub async fn get_slots() -> Json<Value> {
    let slots = generate_slots();
    Json(json!({
        "slots": slots,
        "total": slots.len()
    }))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    if query.doctor_id.trim().is_empty() {
        return Err(AppError::ValidationError("doctor_id is required".to_string()));
    }
    let date = normalize_date(&SheetValue::from(query.date.as_str()));
    if !is_canonical_date(&date) {
        return Err(AppError::ValidationError(format!("Unreadable date: {}", query.date)));
    }

    let appointments = state
        .repository
        .list_appointments()
        .await
        .map_err(AppointmentError::from)?;

    let availability = resolve_availability(&query.doctor_id, &date, &appointments);

    Ok(Json(json!(availability)))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::ValidationError("user_id is required".to_string()));
    }

    let payload = booking_payload(&state.config, &request).await;
    let booking = BookingRequest::new(request.doctor_id, request.date, request.time_slot, payload);

    let guard = BookingGuard::new(Arc::clone(&state.repository));
    let appointment = guard.book(booking).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked"
        })),
    ))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let guard = BookingGuard::new(Arc::clone(&state.repository));
    let outcome = guard.cancel(&appointment_id).await?;

    let message = match outcome {
        CancelOutcome::Deleted { .. } => "Appointment cancelled",
        CancelOutcome::NotFound => "Appointment already removed",
    };

    Ok(Json(json!({
        "appointment_id": appointment_id,
        "result": outcome,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn get_user_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let listing = AppointmentListingService::new(Arc::clone(&state.repository));
    let appointments = listing.list_user_appointments(&user_id).await?;

    Ok(Json(json!(appointments)))
}

/// Fill catalog names the client left out. A catalog outage leaves them
/// empty rather than blocking the booking.
async fn booking_payload(config: &AppConfig, request: &BookAppointmentRequest) -> BookingPayload {
    let mut clinic_name = request.clinic_name.clone();
    let mut doctor_name = request.doctor_name.clone();
    let mut doctor_speciality = request.doctor_speciality.clone();

    if clinic_name.is_none() || doctor_name.is_none() || doctor_speciality.is_none() {
        let catalog = CatalogService::new(config);

        if clinic_name.is_none() {
            match catalog.find_clinic(&request.clinic_id).await {
                Ok(clinic) => clinic_name = Some(clinic.clinic_name),
                Err(e) => warn!("Clinic lookup failed for {}: {}", request.clinic_id, e),
            }
        }

        if doctor_name.is_none() || doctor_speciality.is_none() {
            match catalog.find_doctor(&request.doctor_id).await {
                Ok(doctor) => {
                    if doctor_name.is_none() {
                        doctor_name = Some(doctor.doctor_name);
                    }
                    if doctor_speciality.is_none() {
                        doctor_speciality = Some(doctor.speciality);
                    }
                }
                Err(e) => warn!("Doctor lookup failed for {}: {}", request.doctor_id, e),
            }
        }
    }

    BookingPayload {
        user_id: request.user_id.trim().to_string(),
        user_name: request.user_name.clone(),
        user_national_id: request.user_national_id.clone(),
        clinic_id: request.clinic_id.trim().to_string(),
        clinic_name: clinic_name.unwrap_or_default(),
        doctor_name: doctor_name.unwrap_or_default(),
        doctor_speciality: doctor_speciality.unwrap_or_default(),
    }
}
