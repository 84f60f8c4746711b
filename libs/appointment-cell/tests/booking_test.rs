use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;

use appointment_cell::services::repository::{
    AppointmentRepository, InMemoryAppointmentRepository, InsertOutcome, RepositoryError,
    WriteGuarantee,
};
use appointment_cell::{
    resolve_availability, Appointment, AppointmentError, AppointmentStatus, BookingGuard,
    BookingPayload, BookingRequest, CancelOutcome, RawAppointment,
};
use shared_utils::test_utils::MockSheetResponses;

fn payload(user_id: &str) -> BookingPayload {
    BookingPayload {
        user_id: user_id.to_string(),
        user_name: "Test Patient".to_string(),
        user_national_id: "12345678901".to_string(),
        clinic_id: "C1".to_string(),
        clinic_name: "Cardiology".to_string(),
        doctor_name: "Dr. Ada".to_string(),
        doctor_speciality: "Cardiologist".to_string(),
    }
}

fn request(doctor_id: &str, date: &str, slot: &str, user_id: &str) -> BookingRequest {
    BookingRequest::new(doctor_id, date, slot, payload(user_id))
}

fn guard_over(repository: Arc<InMemoryAppointmentRepository>) -> BookingGuard {
    BookingGuard::new(repository)
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test]
async fn test_book_then_resolve_shows_slot_occupied() {
    let store = Arc::new(InMemoryAppointmentRepository::new());
    let guard = guard_over(Arc::clone(&store));

    let before = resolve_availability("D", "2025-03-10", &store.snapshot().await);
    assert!(before.free.contains(&"09:00".to_string()));

    let appointment = guard
        .book(request("D", "2025-03-10", "09:00", "U1"))
        .await
        .expect("free slot books");

    assert_eq!(appointment.doctor_id, "D");
    assert_eq!(appointment.date, "2025-03-10");
    assert_eq!(appointment.time_slot, "09:00");
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.clinic_name, "Cardiology");
    assert!(appointment.appointment_id.starts_with("APT_"));
    assert!(appointment.created_at.is_some());

    let rows = store.snapshot().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(Appointment::try_from_raw(&rows[0]).unwrap(), appointment);

    let after = resolve_availability("D", "2025-03-10", &rows);
    assert!(after.occupied.contains("09:00"));
    assert!(!after.free.contains(&"09:00".to_string()));
}

#[tokio::test]
async fn test_second_booking_of_same_slot_is_rejected() {
    let store = Arc::new(InMemoryAppointmentRepository::new());
    let guard = guard_over(Arc::clone(&store));

    guard.book(request("D", "2025-03-10", "09:00", "U1")).await.unwrap();
    let second = guard.book(request("D", "2025-03-10", "09:00", "U2")).await;

    assert_matches!(
        second,
        Err(AppointmentError::SlotConflict { ref time_slot, ref occupied, .. })
            if time_slot == "09:00" && occupied.contains("09:00")
    );
    assert_eq!(store.snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_request_encodings_are_normalized_before_checking() {
    let existing: RawAppointment = serde_json::from_value(MockSheetResponses::appointment_row(
        "APT_1",
        "U1",
        "D",
        json!(45726),
        json!(0.375),
    ))
    .unwrap();
    let store = Arc::new(InMemoryAppointmentRepository::with_rows(
        vec![existing],
        WriteGuarantee::BestEffort,
    ));
    let guard = guard_over(Arc::clone(&store));

    let clash = guard.book(request("D", "10.03.2025", "9:00", "U2")).await;
    assert_matches!(clash, Err(AppointmentError::SlotConflict { .. }));

    let booked = guard.book(request("D", "45726", "9:15", "U2")).await.unwrap();
    assert_eq!(booked.date, "2025-03-10");
    assert_eq!(booked.time_slot, "09:15");
}

#[tokio::test]
async fn test_other_doctors_and_days_do_not_conflict() {
    let store = Arc::new(InMemoryAppointmentRepository::new());
    let guard = guard_over(Arc::clone(&store));

    guard.book(request("D1", "2025-03-10", "09:00", "U1")).await.unwrap();
    guard.book(request("D2", "2025-03-10", "09:00", "U2")).await.unwrap();
    guard.book(request("D1", "2025-03-11", "09:00", "U3")).await.unwrap();

    assert_eq!(store.snapshot().await.len(), 3);
}

#[tokio::test]
async fn test_targets_outside_the_catalog_are_invalid() {
    let store = Arc::new(InMemoryAppointmentRepository::new());
    let guard = guard_over(Arc::clone(&store));

    for (date, slot) in [("2025-03-10", "17:00"), ("2025-03-10", "09:10"), ("someday", "09:00")] {
        let result = guard.book(request("D", date, slot, "U1")).await;
        assert_matches!(result, Err(AppointmentError::InvalidRequest(_)), "{} {}", date, slot);
    }
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_write_failure_persists_nothing() {
    let store = Arc::new(InMemoryAppointmentRepository::new());
    store.set_reject_writes(true);
    let guard = guard_over(Arc::clone(&store));

    let result = guard.book(request("D", "2025-03-10", "09:00", "U1")).await;

    assert_matches!(result, Err(AppointmentError::RepositoryFailure(_)));
    assert!(store.snapshot().await.is_empty());
}

// ==============================================================================
// RACES
// ==============================================================================

/// Serves an empty listing to the first read, as if another client's
/// booking landed just after the guard looked.
struct StaleFirstRead<R> {
    inner: R,
    reads: AtomicUsize,
    delegate_commit: bool,
}

impl<R> StaleFirstRead<R> {
    fn new(inner: R, delegate_commit: bool) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            delegate_commit,
        }
    }
}

#[async_trait]
impl<R: AppointmentRepository> AppointmentRepository for StaleFirstRead<R> {
    async fn list_appointments(&self) -> Result<Vec<RawAppointment>, RepositoryError> {
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(Vec::new());
        }
        self.inner.list_appointments().await
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.inner.create_appointment(appointment).await
    }

    async fn delete_appointment_at(&self, index: usize) -> Result<(), RepositoryError> {
        self.inner.delete_appointment_at(index).await
    }

    fn write_guarantee(&self) -> WriteGuarantee {
        self.inner.write_guarantee()
    }

    async fn insert_if_slot_free(
        &self,
        appointment: &Appointment,
    ) -> Result<InsertOutcome, RepositoryError> {
        if self.delegate_commit {
            self.inner.insert_if_slot_free(appointment).await
        } else {
            appointment_cell::services::repository::verify_then_write(self, appointment).await
        }
    }
}

/// Another client writes the same slot between our last check and our write.
struct LateCompetitor {
    inner: InMemoryAppointmentRepository,
    competitor: Appointment,
}

#[async_trait]
impl AppointmentRepository for LateCompetitor {
    async fn list_appointments(&self) -> Result<Vec<RawAppointment>, RepositoryError> {
        self.inner.list_appointments().await
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.inner.create_appointment(&self.competitor).await?;
        self.inner.create_appointment(appointment).await
    }

    async fn delete_appointment_at(&self, index: usize) -> Result<(), RepositoryError> {
        self.inner.delete_appointment_at(index).await
    }
}

async fn seeded(guarantee: WriteGuarantee) -> InMemoryAppointmentRepository {
    let store = InMemoryAppointmentRepository::with_rows(Vec::new(), guarantee);
    let holder: RawAppointment = serde_json::from_value(MockSheetResponses::appointment_row(
        "APT_OTHER",
        "U9",
        "D",
        json!("2025-03-10"),
        json!("09:00"),
    ))
    .unwrap();
    let appointment = Appointment::try_from_raw(&holder).unwrap();
    store.create_appointment(&appointment).await.unwrap();
    store
}

#[tokio::test]
async fn test_pre_commit_verification_catches_a_late_booking() {
    let racing = StaleFirstRead::new(seeded(WriteGuarantee::BestEffort).await, false);
    let guard = BookingGuard::new(Arc::new(racing));

    let result = guard.book(request("D", "2025-03-10", "09:00", "U1")).await;

    assert_matches!(result, Err(AppointmentError::SlotConflict { .. }));
}

#[tokio::test]
async fn test_atomic_store_rejects_a_booking_the_first_check_missed() {
    let racing = Arc::new(StaleFirstRead::new(seeded(WriteGuarantee::Atomic).await, true));
    let guard = BookingGuard::new(Arc::clone(&racing) as Arc<dyn AppointmentRepository>);

    let result = guard.book(request("D", "2025-03-10", "09:00", "U1")).await;

    assert_matches!(result, Err(AppointmentError::SlotConflict { .. }));
    assert_eq!(racing.inner.snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_best_effort_store_leaves_a_residual_race_window() {
    let competitor = Appointment::try_from_raw(
        &serde_json::from_value(MockSheetResponses::appointment_row(
            "APT_LATE",
            "U9",
            "D",
            json!("2025-03-10"),
            json!("09:00"),
        ))
        .unwrap(),
    )
    .unwrap();
    let store = Arc::new(LateCompetitor {
        inner: InMemoryAppointmentRepository::new(),
        competitor,
    });
    let guard = BookingGuard::new(Arc::clone(&store) as Arc<dyn AppointmentRepository>);

    // Both checks pass, the competitor lands in between: a double booking.
    guard.book(request("D", "2025-03-10", "09:00", "U1")).await.unwrap();

    let rows = store.inner.snapshot().await;
    let availability = resolve_availability("D", "2025-03-10", &rows);
    assert_eq!(rows.len(), 2);
    assert_eq!(availability.occupied.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_on_atomic_store_admit_exactly_one() {
    let store = Arc::new(InMemoryAppointmentRepository::atomic());
    let guard = Arc::new(guard_over(Arc::clone(&store)));

    let attempts: Vec<_> = (0..8)
        .map(|n| {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move {
                guard.book(request("D", "2025-03-10", "10:30", &format!("U{}", n))).await
            })
        })
        .collect();

    let mut booked = 0;
    let mut rejected = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => booked += 1,
            Err(AppointmentError::SlotConflict { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(booked, 1);
    assert_eq!(rejected, 7);
    assert_eq!(store.snapshot().await.len(), 1);
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

#[tokio::test]
async fn test_cancel_unknown_id_is_not_found_every_time() {
    let guard = guard_over(Arc::new(InMemoryAppointmentRepository::new()));

    assert_eq!(guard.cancel("APT_missing").await.unwrap(), CancelOutcome::NotFound);
    assert_eq!(guard.cancel("APT_missing").await.unwrap(), CancelOutcome::NotFound);
}

#[tokio::test]
async fn test_cancel_deletes_by_current_position() {
    let store = Arc::new(InMemoryAppointmentRepository::new());
    let guard = guard_over(Arc::clone(&store));

    let first = guard.book(request("D", "2025-03-10", "09:00", "U1")).await.unwrap();
    let second = guard.book(request("D", "2025-03-10", "09:15", "U2")).await.unwrap();
    let third = guard.book(request("D", "2025-03-10", "09:30", "U3")).await.unwrap();

    assert_eq!(
        guard.cancel(&second.appointment_id).await.unwrap(),
        CancelOutcome::Deleted { index: 1 }
    );
    assert_eq!(
        guard.cancel(&third.appointment_id).await.unwrap(),
        CancelOutcome::Deleted { index: 1 }
    );
    assert_eq!(guard.cancel(&third.appointment_id).await.unwrap(), CancelOutcome::NotFound);

    let remaining = store.snapshot().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].appointment_id.as_text(), first.appointment_id);

    // The released slot can be booked again.
    guard.book(request("D", "2025-03-10", "09:15", "U4")).await.unwrap();
}

#[tokio::test]
async fn test_cancel_write_failure_is_a_repository_failure() {
    let store = Arc::new(InMemoryAppointmentRepository::new());
    let guard = guard_over(Arc::clone(&store));
    let booked = guard.book(request("D", "2025-03-10", "09:00", "U1")).await.unwrap();

    store.set_reject_writes(true);
    let result = guard.cancel(&booked.appointment_id).await;

    assert_matches!(result, Err(AppointmentError::RepositoryFailure(_)));
    assert_eq!(store.snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_blank_id_never_matches_rows_without_an_id() {
    let idless: RawAppointment = serde_json::from_value(json!({
        "doctorId": "D",
        "date": "2025-03-10",
        "timeSlot": "09:00",
        "status": "Confirmed"
    }))
    .unwrap();
    let store = Arc::new(InMemoryAppointmentRepository::with_rows(
        vec![idless],
        WriteGuarantee::BestEffort,
    ));
    let guard = guard_over(Arc::clone(&store));

    assert_eq!(guard.cancel("  ").await.unwrap(), CancelOutcome::NotFound);
    assert_eq!(guard.cancel("").await.unwrap(), CancelOutcome::NotFound);
    assert_eq!(store.snapshot().await.len(), 1);
}

// ==============================================================================
// UNREACHABLE STORE
// ==============================================================================

/// Listing always fails; writes are counted so tests can prove none happened.
#[derive(Default)]
struct UnreachableStore {
    writes: AtomicUsize,
}

#[async_trait]
impl AppointmentRepository for UnreachableStore {
    async fn list_appointments(&self) -> Result<Vec<RawAppointment>, RepositoryError> {
        Err(RepositoryError::Backend("connection refused".to_string()))
    }

    async fn create_appointment(&self, _appointment: &Appointment) -> Result<(), RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_appointment_at(&self, _index: usize) -> Result<(), RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_list_failure_aborts_booking_before_any_write() {
    let store = Arc::new(UnreachableStore::default());
    let guard = BookingGuard::new(Arc::clone(&store) as Arc<dyn AppointmentRepository>);

    let result = guard.book(request("D", "2025-03-10", "09:00", "U1")).await;

    assert_matches!(
        result,
        Err(AppointmentError::RepositoryFailure(ref message)) if message.contains("connection refused")
    );
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_list_failure_aborts_cancel_before_any_write() {
    let store = Arc::new(UnreachableStore::default());
    let guard = BookingGuard::new(Arc::clone(&store) as Arc<dyn AppointmentRepository>);

    let result = guard.cancel("APT_1").await;

    assert_matches!(result, Err(AppointmentError::RepositoryFailure(_)));
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}
