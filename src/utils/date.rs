//! Post date parsing and display formatting.
//!
//! Dates without an explicit offset are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a post date.
///
/// Accepts the shapes a TOML datetime renders to, plus plain strings:
/// - `2024-01-15T10:30:00Z` / `2024-01-15T10:30:00+02:00` (RFC 3339)
/// - `2024-01-15T10:30:00` / `2024-01-15 10:30:00` (local datetime)
/// - `2024-01-15` (local date, midnight)
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an inclusive upper bound: a bare `YYYY-MM-DD` means the end of that day.
///
/// Anything with a time component parses as in [`parse_date`].
pub fn parse_end_date(s: &str) -> Option<DateTime<Utc>> {
    match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .map(|naive| naive.and_utc()),
        Err(_) => parse_date(s),
    }
}

/// Format a date for listings: `15 January 2024`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%-d %B %Y").to_string()
}
