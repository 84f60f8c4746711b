use std::sync::Arc;

use tracing::debug;

use shared_config::AppConfig;
use shared_database::SheetClient;

use crate::models::{CatalogError, Clinic, Doctor, RawClinic, RawDoctor};

/// Read-only access to the clinic and doctor tabs.
///
/// The backend cannot filter, so every lookup lists the whole tab and
/// filters client-side.
pub struct CatalogService {
    sheet: Arc<SheetClient>,
    clinics_tab: String,
    doctors_tab: String,
}

impl CatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SheetClient::new(config)), config)
    }

    pub fn with_client(sheet: Arc<SheetClient>, config: &AppConfig) -> Self {
        Self {
            sheet,
            clinics_tab: config.clinics_tab.clone(),
            doctors_tab: config.doctors_tab.clone(),
        }
    }

    pub async fn list_clinics(&self) -> Result<Vec<Clinic>, CatalogError> {
        let rows: Vec<RawClinic> = self
            .sheet
            .list_rows(&self.clinics_tab)
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        let clinics: Vec<Clinic> = rows
            .into_iter()
            .map(Clinic::from)
            .filter(|clinic| !clinic.clinic_id.is_empty())
            .collect();

        debug!("Loaded {} clinics", clinics.len());
        Ok(clinics)
    }

    /// Doctors, optionally restricted to one clinic.
    pub async fn list_doctors(&self, clinic_id: Option<&str>) -> Result<Vec<Doctor>, CatalogError> {
        let rows: Vec<RawDoctor> = self
            .sheet
            .list_rows(&self.doctors_tab)
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        let wanted = clinic_id.map(str::trim);
        let doctors: Vec<Doctor> = rows
            .into_iter()
            .map(Doctor::from)
            .filter(|doctor| !doctor.doctor_id.is_empty())
            .filter(|doctor| wanted.map_or(true, |id| doctor.clinic_id == id))
            .collect();

        debug!("Loaded {} doctors for clinic {:?}", doctors.len(), clinic_id);
        Ok(doctors)
    }

    pub async fn find_clinic(&self, clinic_id: &str) -> Result<Clinic, CatalogError> {
        let wanted = clinic_id.trim();
        self.list_clinics()
            .await?
            .into_iter()
            .find(|clinic| clinic.clinic_id == wanted)
            .ok_or_else(|| CatalogError::ClinicNotFound(clinic_id.to_string()))
    }

    pub async fn find_doctor(&self, doctor_id: &str) -> Result<Doctor, CatalogError> {
        let wanted = doctor_id.trim();
        self.list_doctors(None)
            .await?
            .into_iter()
            .find(|doctor| doctor.doctor_id == wanted)
            .ok_or_else(|| CatalogError::DoctorNotFound(doctor_id.to_string()))
    }
}
