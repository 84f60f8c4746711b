// libs/appointment-cell/src/models.rs
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::SheetValue;

use crate::services::normalizer::{
    is_canonical_date, is_canonical_time, normalize_date, normalize_time,
};

// ==============================================================================
// STORED RECORDS
// ==============================================================================

/// One row of the appointments tab exactly as the store returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppointment {
    #[serde(default)]
    pub appointment_id: SheetValue,
    #[serde(default)]
    pub user_id: SheetValue,
    #[serde(default)]
    pub user_name: SheetValue,
    #[serde(default, rename = "userTC")]
    pub user_national_id: SheetValue,
    #[serde(default)]
    pub clinic_id: SheetValue,
    #[serde(default)]
    pub clinic_name: SheetValue,
    #[serde(default)]
    pub doctor_id: SheetValue,
    #[serde(default)]
    pub doctor_name: SheetValue,
    #[serde(default)]
    pub doctor_speciality: SheetValue,
    #[serde(default)]
    pub date: SheetValue,
    #[serde(default)]
    pub time_slot: SheetValue,
    #[serde(default)]
    pub status: SheetValue,
    #[serde(default)]
    pub created_at: SheetValue,
}

impl RawAppointment {
    pub fn status(&self) -> AppointmentStatus {
        AppointmentStatus::from_sheet(&self.status)
    }
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// An appointment in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub appointment_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(rename = "userTC")]
    pub user_national_id: String,
    pub clinic_id: String,
    pub clinic_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub doctor_speciality: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Strict conversion of a stored row.
    ///
    /// Unlike the lenient normalizers this refuses rows whose date or time
    /// cannot be brought to canonical form.
    pub fn try_from_raw(raw: &RawAppointment) -> Result<Self, AppointmentError> {
        let appointment_id = raw.appointment_id.key();
        if appointment_id.is_empty() {
            return Err(AppointmentError::ParseFailure {
                field: "appointmentId",
                value: raw.appointment_id.as_text(),
            });
        }

        let date = normalize_date(&raw.date);
        if !is_canonical_date(&date) {
            return Err(AppointmentError::ParseFailure {
                field: "date",
                value: raw.date.as_text(),
            });
        }

        let time_slot = normalize_time(&raw.time_slot);
        if !is_canonical_time(&time_slot) {
            return Err(AppointmentError::ParseFailure {
                field: "timeSlot",
                value: raw.time_slot.as_text(),
            });
        }

        let created_at = DateTime::parse_from_rfc3339(raw.created_at.as_text().trim())
            .ok()
            .map(|stamp| stamp.with_timezone(&Utc));

        Ok(Self {
            appointment_id,
            user_id: raw.user_id.key(),
            user_name: raw.user_name.as_text(),
            user_national_id: raw.user_national_id.key(),
            clinic_id: raw.clinic_id.key(),
            clinic_name: raw.clinic_name.as_text(),
            doctor_id: raw.doctor_id.key(),
            doctor_name: raw.doctor_name.as_text(),
            doctor_speciality: raw.doctor_speciality.as_text(),
            date,
            time_slot,
            status: raw.status(),
            created_at,
        })
    }
}

impl From<&Appointment> for RawAppointment {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.appointment_id.clone().into(),
            user_id: appointment.user_id.clone().into(),
            user_name: appointment.user_name.clone().into(),
            user_national_id: appointment.user_national_id.clone().into(),
            clinic_id: appointment.clinic_id.clone().into(),
            clinic_name: appointment.clinic_name.clone().into(),
            doctor_id: appointment.doctor_id.clone().into(),
            doctor_name: appointment.doctor_name.clone().into(),
            doctor_speciality: appointment.doctor_speciality.clone().into(),
            date: appointment.date.clone().into(),
            time_slot: appointment.time_slot.clone().into(),
            status: appointment.status.to_string().into(),
            created_at: appointment
                .created_at
                .map(|stamp| SheetValue::from(stamp.to_rfc3339()))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
    Other(String),
}

impl AppointmentStatus {
    /// Rows written before the status column existed are blank and count
    /// as confirmed.
    pub fn from_sheet(value: &SheetValue) -> Self {
        if value.is_blank() {
            return AppointmentStatus::Confirmed;
        }
        AppointmentStatus::from(value.as_text())
    }

    /// Every status except a cancellation keeps the slot taken.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl From<String> for AppointmentStatus {
    fn from(value: String) -> Self {
        // "İptal" lowercases to "i" + U+0307.
        let folded = value.trim().to_lowercase().replace('\u{307}', "");
        match folded.as_str() {
            "" | "confirmed" | "onaylandı" | "onaylandi" => AppointmentStatus::Confirmed,
            "cancelled" | "canceled" | "iptal" | "iptal edildi" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(value.trim().to_string()),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "Confirmed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::Other(status) => write!(f, "{}", status),
        }
    }
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// Who is booking, and the catalog names copied onto the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingPayload {
    pub user_id: String,
    pub user_name: String,
    pub user_national_id: String,
    pub clinic_id: String,
    pub clinic_name: String,
    pub doctor_name: String,
    pub doctor_speciality: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub doctor_id: String,
    pub date: SheetValue,
    pub time_slot: SheetValue,
    pub payload: BookingPayload,
}

impl BookingRequest {
    pub fn new(
        doctor_id: impl Into<String>,
        date: impl Into<SheetValue>,
        time_slot: impl Into<SheetValue>,
        payload: BookingPayload,
    ) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            date: date.into(),
            time_slot: time_slot.into(),
            payload,
        }
    }
}

/// Body of `POST /appointments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_national_id: String,
    pub clinic_id: String,
    pub clinic_name: Option<String>,
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    pub doctor_speciality: Option<String>,
    pub date: SheetValue,
    pub time_slot: SheetValue,
}

/// Where a booking attempt currently stands. A fresh attempt starts `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPhase {
    Idle,
    Verifying,
    Committing,
    Done,
    Rejected,
}

impl fmt::Display for BookingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingPhase::Idle => write!(f, "idle"),
            BookingPhase::Verifying => write!(f, "verifying"),
            BookingPhase::Committing => write!(f, "committing"),
            BookingPhase::Done => write!(f, "done"),
            BookingPhase::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    Deleted { index: usize },
    NotFound,
}

// ==============================================================================
// AVAILABILITY & LISTING MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor_id: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotAvailability {
    pub doctor_id: String,
    pub date: String,
    /// Catalog slots nobody holds, in catalog order.
    pub free: Vec<String>,
    pub occupied: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAppointments {
    pub user_id: String,
    /// Newest first.
    pub appointments: Vec<Appointment>,
    /// Rows that belong to the user but could not be read.
    pub unreadable: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Slot {time_slot} on {date} is already booked for doctor {doctor_id}")]
    SlotConflict {
        doctor_id: String,
        date: String,
        time_slot: String,
        occupied: BTreeSet<String>,
    },

    #[error("Appointment store failure: {0}")]
    RepositoryFailure(String),

    #[error("Unrecognized {field} value: {value:?}")]
    ParseFailure { field: &'static str, value: String },

    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),
}
