use std::collections::BTreeSet;

use shared_models::SheetValue;

use crate::models::{RawAppointment, SlotAvailability};
use crate::services::normalizer::{normalize_date, normalize_time};
use crate::services::slots::generate_slots;

/// Free and occupied slots of one doctor on one date.
///
/// Stored rows are normalized field by field before comparing, so a row
/// holding `45726` / `0.375` matches a request for `2025-03-10` / `09:00`.
/// Pure: the caller supplies the rows.
pub fn resolve_availability(
    doctor_id: &str,
    date: &str,
    appointments: &[RawAppointment],
) -> SlotAvailability {
    let date = normalize_date(&SheetValue::from(date));
    let doctor_id = doctor_id.trim();

    let occupied = occupied_slots(appointments, doctor_id, &date);
    let free = generate_slots()
        .into_iter()
        .filter(|slot| !occupied.contains(slot))
        .collect();

    SlotAvailability {
        doctor_id: doctor_id.to_string(),
        date,
        free,
        occupied,
    }
}

/// Canonical times held by `doctor_id` on the canonical `date`.
pub fn occupied_slots(
    appointments: &[RawAppointment],
    doctor_id: &str,
    date: &str,
) -> BTreeSet<String> {
    appointments
        .iter()
        .filter(|appointment| holds_day(appointment, doctor_id, date))
        .map(|appointment| normalize_time(&appointment.time_slot))
        .filter(|slot| !slot.is_empty())
        .collect()
}

/// The first slot-holding row for the canonical (doctor, date, slot), if any.
pub fn find_conflict<'a>(
    appointments: &'a [RawAppointment],
    doctor_id: &str,
    date: &str,
    time_slot: &str,
) -> Option<&'a RawAppointment> {
    appointments.iter().find(|appointment| {
        holds_day(appointment, doctor_id, date)
            && normalize_time(&appointment.time_slot) == time_slot
    })
}

fn holds_day(appointment: &RawAppointment, doctor_id: &str, date: &str) -> bool {
    !date.is_empty()
        && appointment.status().occupies_slot()
        && appointment.doctor_id.key() == doctor_id
        && normalize_date(&appointment.date) == date
}
