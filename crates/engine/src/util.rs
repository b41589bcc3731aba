//! Internal helpers shared across the engine.

use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

/// Uppercased, trimmed form used for case-insensitive recipient matching.
pub(crate) fn normalize_identifier(value: &str) -> String {
    value.trim().to_uppercase()
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Short human-shareable reference code for a ledger record.
pub(crate) fn reference_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..8].to_uppercase()
}

/// Start of the UTC calendar day containing `now`: the daily-cap window.
pub(crate) fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Renders minor units as a decimal string (`123456` becomes `1234.56`).
pub(crate) fn format_minor(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn reference_codes_are_short_and_uppercase() {
        let code = reference_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn day_start_truncates_to_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(
            day_start(now),
            Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn format_minor_renders_two_decimals() {
        assert_eq!(format_minor(0), "0.00");
        assert_eq!(format_minor(5), "0.05");
        assert_eq!(format_minor(123_456), "1234.56");
        assert_eq!(format_minor(-100_00), "-100.00");
    }
}
