// Utility functions
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
// `%.f` also matches a missing fraction.
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
];

/// Parses a calendar date from ISO-8601 (date, date-time, RFC 3339) or US
/// `MM/DD/YYYY`. Any time component is discarded.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    // Keep the local calendar date of an offset timestamp.
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Parses a finite real number; surrounding whitespace is allowed.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First calendar day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `MM/DD/YYYY`, the date layout of the serialized panel.
pub fn format_us_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Rounds to one decimal place, ties to even. A rounded negative zero comes
/// back as `0.0`.
pub fn round_one_decimal(value: f64) -> f64 {
    let rounded = (value * 10.0).round_ties_even() / 10.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_supported_date_layouts() {
        assert_eq!(parse_date("2020-05-17"), Some(d(2020, 5, 17)));
        assert_eq!(parse_date("05/17/2020"), Some(d(2020, 5, 17)));
        assert_eq!(parse_date(" 2020-05-17 13:45:00 "), Some(d(2020, 5, 17)));
        assert_eq!(parse_date("2020-05-17T13:45:00"), Some(d(2020, 5, 17)));
        assert_eq!(parse_date("2020-05-17T23:30:00-05:00"), Some(d(2020, 5, 17)));
    }

    #[test]
    fn accepts_fractional_seconds() {
        assert_eq!(parse_date("2020-01-05 00:00:00.000"), Some(d(2020, 1, 5)));
        assert_eq!(parse_date("2020-01-05T12:30:15.123456"), Some(d(2020, 1, 5)));
        assert_eq!(parse_date("01/05/2020 08:00:00.5"), Some(d(2020, 1, 5)));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2020-13-01"), None);
        assert_eq!(parse_date("02/30/2020"), None);
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(parse_number(" 3.5 "), Some(3.5));
        assert_eq!(parse_number("300000"), Some(300000.0));
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn month_start_and_format() {
        assert_eq!(month_start(d(2020, 2, 29)), d(2020, 2, 1));
        assert_eq!(format_us_date(d(2020, 2, 1)), "02/01/2020");
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_one_decimal(3.3333), 3.3);
        assert_eq!(round_one_decimal(2.857142), 2.9);
        assert_eq!(round_one_decimal(0.04), 0.0);
        assert!(round_one_decimal(-0.04).is_sign_positive());
    }
}
