//! Lenient parsers for amount, date and time cells.
//!
//! A defective cell never fails the load: amounts fall back to zero, dates
//! and times to `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d", "%d/%m/%Y"];
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Largest amount accepted from a cell; anything above is treated as garbage.
fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

/// Parse a monetary cell into a non-negative amount.
///
/// Accepts French formatting (`1 234,56`, `1.234,56`), English grouping
/// (`1,234.56`), grouping spaces including non-breaking ones, and a leading
/// minus sign. When both `,` and `.` appear, the last one is the decimal
/// point. Amounts above 10^15 count as unparseable.
pub fn parse_amount(raw: &str) -> Decimal {
    let mut cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if dot > comma => cleaned.retain(|c| c != ','),
        (Some(_), Some(_)) => {
            cleaned.retain(|c| c != '.');
            cleaned = cleaned.replace(',', ".");
        }
        (Some(_), None) => cleaned = cleaned.replace(',', "."),
        _ => {}
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(|amount| amount.abs())
        .ok()
        .filter(|amount| *amount <= max_amount())
        .unwrap_or(Decimal::ZERO)
}

/// Parse a date cell. A date-time value also yields its time of day.
pub fn parse_date_time(raw: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some((date, None));
    }

    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        let local = stamp.naive_local();
        return Some((local.date(), Some(local.time())));
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|stamp| (stamp.date(), Some(stamp.time())))
}

/// Parse a time-of-day cell (`HH:MM:SS` or `HH:MM`).
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("1234.56"), dec("1234.56"));
        assert_eq!(parse_amount("1234,56"), dec("1234.56"));
        assert_eq!(parse_amount("1 234,56"), dec("1234.56"));
        assert_eq!(parse_amount("1\u{a0}234,56"), dec("1234.56"));
        assert_eq!(parse_amount("1.234,56"), dec("1234.56"));
        assert_eq!(parse_amount("1,234.56"), dec("1234.56"));
        assert_eq!(parse_amount("1,234,567.8"), dec("1234567.8"));
        assert_eq!(parse_amount(" 42 "), dec("42"));
    }

    #[test]
    fn test_parse_amount_rejects_out_of_range() {
        assert_eq!(parse_amount("1000000000000000"), dec("1000000000000000"));
        assert_eq!(parse_amount("1000000000000001"), Decimal::ZERO);
        assert_eq!(parse_amount("79228162514264337593543950335"), Decimal::ZERO);
        assert_eq!(parse_amount("-9e20"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_negative_is_absolute() {
        assert_eq!(parse_amount("-150,00"), dec("150"));
    }

    #[test]
    fn test_parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("n/a"), Decimal::ZERO);
        assert_eq!(parse_amount("12abc"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_fec_native_date() {
        let (date, time) = parse_date_time("20230115").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        assert_eq!(time, None);
    }

    #[test]
    fn test_parse_other_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
        assert_eq!(parse_date_time("2023-03-31").map(|d| d.0), Some(expected));
        assert_eq!(parse_date_time("31/03/2023").map(|d| d.0), Some(expected));
    }

    #[test]
    fn test_parse_date_time_keeps_time() {
        let (date, time) = parse_date_time("2023-03-31T23:45:10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());
        assert_eq!(time, NaiveTime::from_hms_opt(23, 45, 10));

        let (_, time) = parse_date_time("2023-03-31 06:05").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(6, 5, 0));
    }

    #[test]
    fn test_bad_dates_are_none() {
        assert_eq!(parse_date_time(""), None);
        assert_eq!(parse_date_time("20231340"), None);
        assert_eq!(parse_date_time("yesterday"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("23:59:59"), NaiveTime::from_hms_opt(23, 59, 59));
        assert_eq!(parse_time("7:30"), NaiveTime::from_hms_opt(7, 30, 0));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time(""), None);
    }
}
