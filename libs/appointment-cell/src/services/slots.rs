//! The fixed catalog of bookable slots in a clinic working day.

/// First bookable hour (inclusive).
pub const WORKDAY_START_HOUR: u32 = 8;
/// Hour the working day ends (exclusive).
pub const WORKDAY_END_HOUR: u32 = 17;
pub const SLOT_MINUTES: u32 = 15;
pub const SLOTS_PER_DAY: usize =
    ((WORKDAY_END_HOUR - WORKDAY_START_HOUR) * 60 / SLOT_MINUTES) as usize;

/// All bookable slots as canonical `HH:MM` strings, earliest first.
///
/// Every doctor shares the same catalog on every day.
pub fn generate_slots() -> Vec<String> {
    (WORKDAY_START_HOUR * 60..WORKDAY_END_HOUR * 60)
        .step_by(SLOT_MINUTES as usize)
        .map(|minute| format!("{:02}:{:02}", minute / 60, minute % 60))
        .collect()
}

/// Whether `slot` (already canonical) is one of the catalog slots.
pub fn is_catalog_slot(slot: &str) -> bool {
    let Some((hour, minute)) = slot.split_once(':') else {
        return false;
    };
    if hour.len() != 2
        || minute.len() != 2
        || !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit())
    {
        return false;
    }

    match (hour.parse::<u32>(), minute.parse::<u32>()) {
        (Ok(hour), Ok(minute)) => {
            (WORKDAY_START_HOUR..WORKDAY_END_HOUR).contains(&hour)
                && minute < 60
                && minute % SLOT_MINUTES == 0
        }
        _ => false,
    }
}
