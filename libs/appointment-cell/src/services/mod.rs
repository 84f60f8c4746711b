pub mod availability;
pub mod booking;
pub mod listing;
pub mod normalizer;
pub mod repository;
pub mod slots;

pub use availability::resolve_availability;
pub use booking::BookingGuard;
pub use listing::AppointmentListingService;
pub use normalizer::{normalize_date, normalize_time};
pub use repository::{
    AppointmentRepository, InMemoryAppointmentRepository, InsertOutcome, RepositoryError,
    SheetAppointmentRepository, WriteGuarantee,
};
pub use slots::generate_slots;
