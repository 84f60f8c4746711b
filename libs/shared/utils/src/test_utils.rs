use std::sync::Arc;
use serde_json::{json, Value};

use shared_config::{AppConfig, AppointmentStore};

pub struct TestConfig {
    pub sheet_best_url: String,
    pub appointment_store: AppointmentStore,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            sheet_best_url: "http://localhost:54321/api".to_string(),
            appointment_store: AppointmentStore::Sheet,
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock sheet server, e.g. `MockServer::uri()`.
    pub fn with_sheet_url(url: &str) -> Self {
        Self {
            sheet_best_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn in_memory(atomic: bool) -> Self {
        Self {
            appointment_store: if atomic {
                AppointmentStore::MemoryAtomic
            } else {
                AppointmentStore::Memory
            },
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            sheet_best_url: self.sheet_best_url.clone(),
            appointment_store: self.appointment_store,
            request_timeout_secs: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Rows shaped the way the spreadsheet backend returns them.
pub struct MockSheetResponses;

impl MockSheetResponses {
    pub fn appointment_row(
        appointment_id: &str,
        user_id: &str,
        doctor_id: &str,
        date: Value,
        time_slot: Value,
    ) -> Value {
        json!({
            "appointmentId": appointment_id,
            "userId": user_id,
            "userName": "Test Patient",
            "userTC": "12345678901",
            "clinicId": "C1",
            "clinicName": "Cardiology",
            "doctorId": doctor_id,
            "doctorName": "Dr. Test",
            "doctorSpeciality": "Cardiologist",
            "date": date,
            "timeSlot": time_slot,
            "status": "Onaylandı",
            "createdAt": "2025-03-01T08:30:00.000Z"
        })
    }

    pub fn clinic_row(clinic_id: &str, clinic_name: &str) -> Value {
        json!({
            "clinicId": clinic_id,
            "clinicName": clinic_name
        })
    }

    pub fn doctor_row(
        doctor_id: &str,
        doctor_name: &str,
        speciality: &str,
        clinic_id: &str,
    ) -> Value {
        json!({
            "doctorId": doctor_id,
            "doctorName": doctor_name,
            "speciality": speciality,
            "clinicId": clinic_id
        })
    }
}
