use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, AppointmentStore};

use crate::services::repository::{
    AppointmentRepository, InMemoryAppointmentRepository, SheetAppointmentRepository,
};

/// Shared by every appointment handler. The repository lives here rather
/// than being built per request so that in-memory stores persist.
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub repository: Arc<dyn AppointmentRepository>,
}

impl AppointmentState {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let repository: Arc<dyn AppointmentRepository> = match config.appointment_store {
            AppointmentStore::Sheet => Arc::new(SheetAppointmentRepository::new(&config)),
            AppointmentStore::Memory => Arc::new(InMemoryAppointmentRepository::new()),
            AppointmentStore::MemoryAtomic => Arc::new(InMemoryAppointmentRepository::atomic()),
        };

        info!(
            "Appointment store: {:?} ({:?} writes)",
            config.appointment_store,
            repository.write_guarantee()
        );

        Self { config, repository }
    }

    pub fn with_repository(
        config: Arc<AppConfig>,
        repository: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self { config, repository }
    }
}
