//! Appointment slot allocation: normalization of stored date/time values,
//! the daily slot catalog, per-doctor availability and verify-then-commit
//! booking against a store without conditional writes.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use models::{
    Appointment, AppointmentError, AppointmentStatus, BookingPayload, BookingRequest,
    CancelOutcome, RawAppointment, SlotAvailability,
};
pub use router::appointment_routes;
pub use services::{
    generate_slots, normalize_date, normalize_time, resolve_availability, BookingGuard,
};
pub use state::AppointmentState;
