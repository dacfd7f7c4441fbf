//! Timestamp rendering shared by the drivers.
//!
//! Local timestamps are naive (no offset). Microseconds are written as six digits and left
//! out entirely when they are zero, so `12:00:00` sorts before `12:00:00.000001`.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Timelike, Utc};
use std::time::SystemTime;

const ISO_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const ISO_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[must_use]
pub(crate) fn iso_naive(ts: &NaiveDateTime) -> String {
    let format = if ts.nanosecond() / 1_000 == 0 { ISO_SECONDS } else { ISO_MICROS };
    ts.format(format).to_string()
}

#[must_use]
pub(crate) fn now_iso() -> String {
    iso_naive(&Local::now().naive_local())
}

/// Filesystem modification time as a naive local timestamp.
#[must_use]
pub(crate) fn system_time_local(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

#[must_use]
pub(crate) fn iso_utc(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parses a caller-supplied bound (`YYYY-MM-DD` or a naive ISO datetime).
///
/// Date-only upper bounds are widened to the last instant of that day.
pub(crate) fn parse_bound(raw: &str, upper: bool) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local).naive_local());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if upper {
        NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_naive_drops_zero_micros() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(7, 8, 9))
            .unwrap();
        assert_eq!(iso_naive(&ts), "2024-03-05T07:08:09");

        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_micro_opt(7, 8, 9, 50))
            .unwrap();
        assert_eq!(iso_naive(&ts), "2024-03-05T07:08:09.000050");
    }

    #[test]
    fn test_parse_bound_date_only() {
        let lower = parse_bound("2024-03-05", false).unwrap();
        let upper = parse_bound("2024-03-05", true).unwrap();
        assert_eq!(iso_naive(&lower), "2024-03-05T00:00:00");
        assert_eq!(iso_naive(&upper), "2024-03-05T23:59:59.999999");
    }

    #[test]
    fn test_parse_bound_rejects_garbage() {
        assert!(parse_bound("3/5/2024", false).is_none());
    }
}
