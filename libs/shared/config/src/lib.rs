use std::env;
use tracing::warn;

/// Which appointment store the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStore {
    /// Spreadsheet REST backend, verify-then-write.
    Sheet,
    /// Process-local store, verify-then-write.
    Memory,
    /// Process-local store with an atomic conditional insert.
    MemoryAtomic,
}

impl AppointmentStore {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sheet" => Some(Self::Sheet),
            "memory" => Some(Self::Memory),
            "memory-atomic" | "memory_atomic" => Some(Self::MemoryAtomic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sheet_best_url: String,
    pub appointments_tab: String,
    pub clinics_tab: String,
    pub doctors_tab: String,
    pub appointment_store: AppointmentStore,
    pub request_timeout_secs: u64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheet_best_url: String::new(),
            appointments_tab: "Appointments".to_string(),
            clinics_tab: "Clinics".to_string(),
            doctors_tab: "Doctors".to_string(),
            appointment_store: AppointmentStore::Sheet,
            request_timeout_secs: 10,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            sheet_best_url: env::var("SHEET_BEST_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("SHEET_BEST_URL not set, using empty value");
                    String::new()
                }),
            appointments_tab: env::var("APPOINTMENTS_TAB")
                .unwrap_or(defaults.appointments_tab),
            clinics_tab: env::var("CLINICS_TAB")
                .unwrap_or(defaults.clinics_tab),
            doctors_tab: env::var("DOCTORS_TAB")
                .unwrap_or(defaults.doctors_tab),
            appointment_store: match env::var("APPOINTMENT_STORE") {
                Ok(value) => AppointmentStore::parse(&value).unwrap_or_else(|| {
                    warn!("Unknown APPOINTMENT_STORE '{}', using sheet", value);
                    AppointmentStore::Sheet
                }),
                Err(_) => defaults.appointment_store,
            },
            request_timeout_secs: env::var("SHEET_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PORT not set or invalid, using default {}", defaults.port);
                    defaults.port
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - sheet backend URL is missing");
        }

        config
    }

    /// The sheet backend is required unless appointments live in memory;
    /// the catalog is always read from the sheet.
    pub fn is_configured(&self) -> bool {
        !self.sheet_best_url.is_empty()
    }
}
