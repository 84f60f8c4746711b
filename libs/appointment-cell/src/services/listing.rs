use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, UserAppointments};
use crate::services::repository::AppointmentRepository;

pub struct AppointmentListingService {
    repository: Arc<dyn AppointmentRepository>,
}

impl AppointmentListingService {
    pub fn new(repository: Arc<dyn AppointmentRepository>) -> Self {
        Self { repository }
    }

    /// The user's appointments, newest first.
    ///
    /// Rows that cannot be brought to canonical form are left out and
    /// counted instead of failing the whole listing.
    pub async fn list_user_appointments(
        &self,
        user_id: &str,
    ) -> Result<UserAppointments, AppointmentError> {
        let wanted = user_id.trim();
        let rows = self.repository.list_appointments().await?;

        let mut appointments = Vec::new();
        let mut unreadable = 0;

        for row in rows.iter().filter(|row| row.user_id.key() == wanted) {
            match Appointment::try_from_raw(row) {
                Ok(appointment) => appointments.push(appointment),
                Err(e) => {
                    warn!("Skipping unreadable appointment row for user {}: {}", wanted, e);
                    unreadable += 1;
                }
            }
        }

        // Canonical dates and times sort chronologically as text.
        appointments.sort_by(|a, b| {
            (b.date.as_str(), b.time_slot.as_str()).cmp(&(a.date.as_str(), a.time_slot.as_str()))
        });

        debug!(
            "User {} has {} appointments ({} unreadable)",
            wanted,
            appointments.len(),
            unreadable
        );

        Ok(UserAppointments {
            user_id: wanted.to_string(),
            appointments,
            unreadable,
        })
    }
}
