//! Canonicalization of stored date and time values.
//!
//! The appointment store keeps whatever the writer sent: ISO dates,
//! spreadsheet day serials (`45726`), fractional days for clock times
//! (`0.375`), or clock strings missing their padding (`9:0`). Both
//! normalizers are total: input they cannot read is handed back unchanged
//! so that comparisons degrade to "no match" instead of failing.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use shared_models::SheetValue;

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";
pub const CANONICAL_TIME_FORMAT: &str = "%H:%M";

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

// Spreadsheet serials beyond this are not calendar dates.
const MAX_DAY_SERIAL: f64 = 3_000_000.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d", "%m/%d/%Y"];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Normalize a stored date to `YYYY-MM-DD`.
///
/// Purely numeric values are day counts since 1899-12-30 (the spreadsheet
/// epoch); any fractional part is dropped. Text is tried against the
/// accepted date formats. Blank input yields an empty string and anything
/// unreadable is returned verbatim.
pub fn normalize_date(value: &SheetValue) -> String {
    if value.is_blank() {
        return String::new();
    }

    if let Some(days) = value.as_number() {
        return day_serial_to_date(days)
            .map(|date| date.format(CANONICAL_DATE_FORMAT).to_string())
            .unwrap_or_else(|| value.as_text());
    }

    match value {
        SheetValue::Text(text) => parse_date_text(text.trim())
            .map(|date| date.format(CANONICAL_DATE_FORMAT).to_string())
            .unwrap_or_else(|| text.clone()),
        other => other.as_text(),
    }
}

/// Normalize a stored clock time to zero-padded `HH:MM`.
///
/// Numbers (and numeric text without a colon) are fractions of a day.
/// Colon-separated text gets its hour padded to two digits and a missing
/// minute defaulted to `00`; seconds are dropped.
pub fn normalize_time(value: &SheetValue) -> String {
    if value.is_blank() {
        return String::new();
    }

    let text = value.as_text();
    let trimmed = text.trim();

    if !trimmed.contains(':') {
        return match value.as_number() {
            Some(fraction) => fraction_to_clock(fraction).unwrap_or(text),
            None => text,
        };
    }

    pad_clock(trimmed)
}

pub fn is_canonical_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, CANONICAL_DATE_FORMAT).is_ok()
}

pub fn is_canonical_time(value: &str) -> bool {
    value.len() == 5 && NaiveTime::parse_from_str(value, CANONICAL_TIME_FORMAT).is_ok()
}

fn day_serial_to_date(days: f64) -> Option<NaiveDate> {
    let whole = days.trunc();
    if whole.abs() > MAX_DAY_SERIAL {
        return None;
    }

    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(whole as i64))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|stamp| stamp.date())
        })
}

fn fraction_to_clock(fraction: f64) -> Option<String> {
    if !fraction.is_finite() || fraction < 0.0 {
        return None;
    }

    let total_minutes = (fraction * MINUTES_PER_DAY).round() as i64;
    Some(format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60))
}

fn pad_clock(text: &str) -> String {
    let mut parts = text.split(':');
    let hour = parts.next().unwrap_or_default();
    let minute = parts.next();

    let hour = if hour.chars().count() == 1 {
        format!("0{}", hour)
    } else {
        hour.to_string()
    };

    let minute = match minute {
        None | Some("") => "00".to_string(),
        Some(m) if m.chars().count() == 1 => format!("0{}", m),
        Some(m) => m.to_string(),
    };

    format!("{}:{}", hour, minute)
}
