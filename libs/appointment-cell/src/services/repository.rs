//! Appointment storage behind a capability trait.
//!
//! The guard only ever talks to [`AppointmentRepository`]. A store that can
//! check and insert in one step reports [`WriteGuarantee::Atomic`] and
//! overrides [`AppointmentRepository::insert_if_slot_free`]; every other
//! store inherits the verify-then-write default, which re-reads the
//! collection right before writing. That narrows the window in which two
//! clients can book the same slot but does not close it.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::SheetClient;

use crate::models::{Appointment, AppointmentError, RawAppointment};
use crate::services::availability::{find_conflict, occupied_slots};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Appointment store unavailable: {0}")]
    Backend(String),

    #[error("Appointment store rejected the write: {0}")]
    WriteRejected(String),

    #[error("No appointment row at position {0}")]
    RowMissing(usize),
}

impl From<RepositoryError> for AppointmentError {
    fn from(e: RepositoryError) -> Self {
        AppointmentError::RepositoryFailure(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteGuarantee {
    /// Conflicts are re-checked just before the write; a race can still slip through.
    BestEffort,
    /// Check and insert happen as one step.
    Atomic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Conflict { occupied: BTreeSet<String> },
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Every stored row, in store order. Row positions are what
    /// [`delete_appointment_at`](Self::delete_appointment_at) addresses.
    async fn list_appointments(&self) -> Result<Vec<RawAppointment>, RepositoryError>;

    /// Unconditional append. The store enforces no uniqueness.
    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError>;

    async fn delete_appointment_at(&self, index: usize) -> Result<(), RepositoryError>;

    fn write_guarantee(&self) -> WriteGuarantee {
        WriteGuarantee::BestEffort
    }

    /// Insert `appointment` unless its (doctor, date, slot) is already held.
    async fn insert_if_slot_free(
        &self,
        appointment: &Appointment,
    ) -> Result<InsertOutcome, RepositoryError> {
        verify_then_write(self, appointment).await
    }
}

/// Re-read, re-check, then append.
pub async fn verify_then_write<R>(
    repository: &R,
    appointment: &Appointment,
) -> Result<InsertOutcome, RepositoryError>
where
    R: AppointmentRepository + ?Sized,
{
    let current = repository.list_appointments().await?;
    if let Some(conflict) = conflict_outcome(&current, appointment) {
        return Ok(conflict);
    }

    repository.create_appointment(appointment).await?;
    Ok(InsertOutcome::Inserted)
}

fn conflict_outcome(rows: &[RawAppointment], appointment: &Appointment) -> Option<InsertOutcome> {
    find_conflict(rows, &appointment.doctor_id, &appointment.date, &appointment.time_slot)?;

    Some(InsertOutcome::Conflict {
        occupied: occupied_slots(rows, &appointment.doctor_id, &appointment.date),
    })
}

// ==============================================================================
// SPREADSHEET BACKEND
// ==============================================================================

pub struct SheetAppointmentRepository {
    sheet: Arc<SheetClient>,
    tab: String,
}

impl SheetAppointmentRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SheetClient::new(config)), &config.appointments_tab)
    }

    pub fn with_client(sheet: Arc<SheetClient>, tab: &str) -> Self {
        Self {
            sheet,
            tab: tab.to_string(),
        }
    }
}

#[async_trait]
impl AppointmentRepository for SheetAppointmentRepository {
    async fn list_appointments(&self) -> Result<Vec<RawAppointment>, RepositoryError> {
        let rows = self
            .sheet
            .list_rows::<RawAppointment>(&self.tab)
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        debug!("Fetched {} appointment rows from tab {}", rows.len(), self.tab);
        Ok(rows)
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        let row = serde_json::to_value(appointment)
            .map_err(|e| RepositoryError::WriteRejected(e.to_string()))?;

        self.sheet
            .append_row(&self.tab, row)
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))
    }

    async fn delete_appointment_at(&self, index: usize) -> Result<(), RepositoryError> {
        self.sheet
            .delete_row(&self.tab, index)
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))
    }
}

// ==============================================================================
// IN-MEMORY BACKEND
// ==============================================================================

/// Process-local store. In [`WriteGuarantee::Atomic`] mode the conflict
/// check and the insert run under a single lock acquisition.
pub struct InMemoryAppointmentRepository {
    rows: Mutex<Vec<RawAppointment>>,
    guarantee: WriteGuarantee,
    reject_writes: AtomicBool,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::with_rows(Vec::new(), WriteGuarantee::BestEffort)
    }

    pub fn atomic() -> Self {
        Self::with_rows(Vec::new(), WriteGuarantee::Atomic)
    }

    pub fn with_rows(rows: Vec<RawAppointment>, guarantee: WriteGuarantee) -> Self {
        Self {
            rows: Mutex::new(rows),
            guarantee,
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent create/delete fail, as an unreachable backend would.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Vec<RawAppointment> {
        self.rows.lock().await.clone()
    }

    fn ensure_writable(&self) -> Result<(), RepositoryError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            warn!("In-memory appointment store is rejecting writes");
            return Err(RepositoryError::WriteRejected("store is read-only".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryAppointmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn list_appointments(&self) -> Result<Vec<RawAppointment>, RepositoryError> {
        Ok(self.rows.lock().await.clone())
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.ensure_writable()?;
        self.rows.lock().await.push(RawAppointment::from(appointment));
        Ok(())
    }

    async fn delete_appointment_at(&self, index: usize) -> Result<(), RepositoryError> {
        self.ensure_writable()?;
        let mut rows = self.rows.lock().await;
        if index >= rows.len() {
            return Err(RepositoryError::RowMissing(index));
        }
        rows.remove(index);
        Ok(())
    }

    fn write_guarantee(&self) -> WriteGuarantee {
        self.guarantee
    }

    async fn insert_if_slot_free(
        &self,
        appointment: &Appointment,
    ) -> Result<InsertOutcome, RepositoryError> {
        if self.guarantee == WriteGuarantee::BestEffort {
            return verify_then_write(self, appointment).await;
        }

        let mut rows = self.rows.lock().await;
        if let Some(conflict) = conflict_outcome(&rows, appointment) {
            return Ok(conflict);
        }

        self.ensure_writable()?;
        rows.push(RawAppointment::from(appointment));
        Ok(InsertOutcome::Inserted)
    }
}
