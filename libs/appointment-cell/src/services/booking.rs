// libs/appointment-cell/src/services/booking.rs
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use tracing::{debug, info, warn};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookingPhase, BookingRequest,
    CancelOutcome,
};
use crate::services::availability::{find_conflict, occupied_slots};
use crate::services::normalizer::{is_canonical_date, normalize_date, normalize_time};
use crate::services::repository::{AppointmentRepository, InsertOutcome};
use crate::services::slots::is_catalog_slot;

const APPOINTMENT_ID_PREFIX: &str = "APT";
const APPOINTMENT_ID_SUFFIX_LEN: usize = 6;

static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Books and cancels appointments against a repository that offers no
/// locking.
///
/// Booking is verify-then-commit: the collection is checked for a holder of
/// the requested (doctor, date, slot), and the commit goes through
/// [`AppointmentRepository::insert_if_slot_free`], which re-checks right
/// before writing (or checks and writes atomically, if the store can).
/// Nothing is retried; a rejected caller resubmits.
pub struct BookingGuard {
    repository: Arc<dyn AppointmentRepository>,
}

impl BookingGuard {
    pub fn new(repository: Arc<dyn AppointmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn book(&self, request: BookingRequest) -> Result<Appointment, AppointmentError> {
        let mut phase = BookingPhase::Idle;

        let doctor_id = request.doctor_id.trim().to_string();
        let date = normalize_date(&request.date);
        let time_slot = normalize_time(&request.time_slot);
        validate_target(&doctor_id, &date, &time_slot)?;

        info!(
            "Booking slot {} on {} for doctor {} (user {}, {:?} store)",
            time_slot,
            date,
            doctor_id,
            request.payload.user_id,
            self.repository.write_guarantee()
        );

        advance(&mut phase, BookingPhase::Verifying, &doctor_id, &date, &time_slot);
        let current = match self.repository.list_appointments().await {
            Ok(rows) => rows,
            Err(e) => return Err(reject(&mut phase, e.into())),
        };

        if find_conflict(&current, &doctor_id, &date, &time_slot).is_some() {
            let occupied = occupied_slots(&current, &doctor_id, &date);
            return Err(reject(
                &mut phase,
                AppointmentError::SlotConflict { doctor_id, date, time_slot, occupied },
            ));
        }

        let payload = request.payload;
        let appointment = Appointment {
            appointment_id: generate_appointment_id(),
            user_id: payload.user_id,
            user_name: payload.user_name,
            user_national_id: payload.user_national_id,
            clinic_id: payload.clinic_id,
            clinic_name: payload.clinic_name,
            doctor_id,
            doctor_name: payload.doctor_name,
            doctor_speciality: payload.doctor_speciality,
            date,
            time_slot,
            status: AppointmentStatus::Confirmed,
            created_at: Some(Utc::now()),
        };

        advance(
            &mut phase,
            BookingPhase::Committing,
            &appointment.doctor_id,
            &appointment.date,
            &appointment.time_slot,
        );

        match self.repository.insert_if_slot_free(&appointment).await {
            Ok(InsertOutcome::Inserted) => {
                advance(
                    &mut phase,
                    BookingPhase::Done,
                    &appointment.doctor_id,
                    &appointment.date,
                    &appointment.time_slot,
                );
                info!(
                    "Appointment {} booked for doctor {} at {} {}",
                    appointment.appointment_id,
                    appointment.doctor_id,
                    appointment.date,
                    appointment.time_slot
                );
                Ok(appointment)
            }
            Ok(InsertOutcome::Conflict { occupied }) => Err(reject(
                &mut phase,
                AppointmentError::SlotConflict {
                    doctor_id: appointment.doctor_id,
                    date: appointment.date,
                    time_slot: appointment.time_slot,
                    occupied,
                },
            )),
            Err(e) => Err(reject(&mut phase, e.into())),
        }
    }

    /// Delete the appointment with `appointment_id`.
    ///
    /// The store addresses rows by position, so the row index is looked up
    /// from a fresh listing first. An id that is already gone is reported
    /// as [`CancelOutcome::NotFound`], not as an error.
    pub async fn cancel(&self, appointment_id: &str) -> Result<CancelOutcome, AppointmentError> {
        let wanted = appointment_id.trim();
        if wanted.is_empty() {
            info!("Blank appointment id, nothing to cancel");
            return Ok(CancelOutcome::NotFound);
        }
        debug!("Cancelling appointment {}", wanted);

        let current = self.repository.list_appointments().await?;
        let Some(index) = current.iter().position(|row| {
            let key = row.appointment_id.key();
            !key.is_empty() && key == wanted
        }) else {
            info!("Appointment {} not found, nothing to cancel", wanted);
            return Ok(CancelOutcome::NotFound);
        };

        self.repository.delete_appointment_at(index).await?;

        info!("Appointment {} deleted from position {}", wanted, index);
        Ok(CancelOutcome::Deleted { index })
    }
}

/// `APT_<millis>_<suffix>`: the millisecond component never repeats within
/// a process, the random suffix separates processes.
pub fn generate_appointment_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(APPOINTMENT_ID_SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("{}_{}_{}", APPOINTMENT_ID_PREFIX, next_id_millis(), suffix)
}

fn next_id_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID_MILLIS.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID_MILLIS.compare_exchange_weak(
            last,
            candidate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

fn validate_target(doctor_id: &str, date: &str, time_slot: &str) -> Result<(), AppointmentError> {
    if doctor_id.is_empty() {
        return Err(AppointmentError::InvalidRequest("doctor id is required".to_string()));
    }
    if !is_canonical_date(date) {
        return Err(AppointmentError::InvalidRequest(format!("unreadable date {:?}", date)));
    }
    if !is_catalog_slot(time_slot) {
        return Err(AppointmentError::InvalidRequest(format!(
            "{:?} is not a bookable slot",
            time_slot
        )));
    }
    Ok(())
}

fn advance(
    phase: &mut BookingPhase,
    next: BookingPhase,
    doctor_id: &str,
    date: &str,
    time_slot: &str,
) {
    debug!("Booking {} {} {}: {} -> {}", doctor_id, date, time_slot, phase, next);
    *phase = next;
}

fn reject(phase: &mut BookingPhase, error: AppointmentError) -> AppointmentError {
    warn!("Booking rejected while {}: {}", phase, error);
    *phase = BookingPhase::Rejected;
    error
}
