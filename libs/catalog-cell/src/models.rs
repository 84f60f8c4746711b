use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::SheetValue;

// ==============================================================================
// SHEET ROWS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClinic {
    #[serde(default)]
    pub clinic_id: SheetValue,
    #[serde(default)]
    pub clinic_name: SheetValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDoctor {
    #[serde(default)]
    pub doctor_id: SheetValue,
    #[serde(default)]
    pub doctor_name: SheetValue,
    #[serde(default)]
    pub speciality: SheetValue,
    #[serde(default)]
    pub clinic_id: SheetValue,
}

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub clinic_id: String,
    pub clinic_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub doctor_id: String,
    pub doctor_name: String,
    pub speciality: String,
    pub clinic_id: String,
}

impl From<RawClinic> for Clinic {
    fn from(raw: RawClinic) -> Self {
        Self {
            clinic_id: raw.clinic_id.key(),
            clinic_name: raw.clinic_name.as_text(),
        }
    }
}

impl From<RawDoctor> for Doctor {
    fn from(raw: RawDoctor) -> Self {
        Self {
            doctor_id: raw.doctor_id.key(),
            doctor_name: raw.doctor_name.as_text(),
            speciality: raw.speciality.as_text(),
            clinic_id: raw.clinic_id.key(),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog backend error: {0}")]
    Backend(String),

    #[error("Clinic not found: {0}")]
    ClinicNotFound(String),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),
}
