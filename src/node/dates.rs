//! Due-date normalization for payable-account queries.
//!
//! Bling expects `dataVencimentoFinal` as a plain `YYYY-MM-DD` date. Host date
//! pickers send full timestamps, so any accepted input is reduced to its UTC
//! calendar date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::NodeError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// ISO timestamp with an offset that may lack the colon (`+0000`).
const OFFSET_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Naive timestamp layouts, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Returns the due-date bound to send: `today` when `input` is absent,
/// otherwise the input reformatted as `YYYY-MM-DD`.
pub fn normalize_due_date(input: Option<&str>, today: NaiveDate) -> Result<String, NodeError> {
    let date = match input.map(str::trim).filter(|s| !s.is_empty()) {
        None => today,
        Some(raw) => parse_date(raw).ok_or_else(|| {
            NodeError::validation(format!(
                "Invalid date for dataVencimentoFinal: \"{}\"",
                raw
            ))
        })?,
    };
    Ok(date.format(DATE_FORMAT).to_string())
}

/// Current calendar date in UTC.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, OFFSET_DATETIME_FORMAT) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_absent_date_defaults_to_today() {
        assert_eq!(normalize_due_date(None, today()).unwrap(), "2026-10-16");
        assert_eq!(normalize_due_date(Some(""), today()).unwrap(), "2026-10-16");
    }

    #[test]
    fn test_rfc3339_reduced_to_date() {
        assert_eq!(
            normalize_due_date(Some("2024-03-15T10:00:00Z"), today()).unwrap(),
            "2024-03-15"
        );
    }

    #[test]
    fn test_offset_converted_to_utc_first() {
        // 23:30 at UTC-3 is already the next day in UTC.
        assert_eq!(
            normalize_due_date(Some("2024-03-15T23:30:00-03:00"), today()).unwrap(),
            "2024-03-16"
        );
    }

    #[test]
    fn test_naive_formats() {
        assert_eq!(
            normalize_due_date(Some("2024-03-15T10:00:00.000"), today()).unwrap(),
            "2024-03-15"
        );
        assert_eq!(
            normalize_due_date(Some("2024-03-15 08:15"), today()).unwrap(),
            "2024-03-15"
        );
        assert_eq!(normalize_due_date(Some("2024-03-15"), today()).unwrap(), "2024-03-15");
    }

    #[test]
    fn test_offset_without_colon_and_rfc2822() {
        assert_eq!(
            normalize_due_date(Some("2024-03-15T10:00:00+0000"), today()).unwrap(),
            "2024-03-15"
        );
        assert_eq!(
            normalize_due_date(Some("2024-03-15T22:00:00.500-0300"), today()).unwrap(),
            "2024-03-16"
        );
        assert_eq!(
            normalize_due_date(Some("Fri, 15 Mar 2024 10:00:00 GMT"), today()).unwrap(),
            "2024-03-15"
        );
        assert_eq!(
            normalize_due_date(Some("Fri, 15 Mar 2024 23:00:00 -0300"), today()).unwrap(),
            "2024-03-16"
        );
    }

    #[test]
    fn test_garbage_is_validation_error() {
        let err = normalize_due_date(Some("next tuesday"), today()).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("next tuesday"));
    }
}
