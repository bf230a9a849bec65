use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

use crate::error::{ForcingError, Result};

/// Six-component timestamp (Y, M, D, h, m, s) as stored in `/Time`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamp(pub [f64; 6]);

impl Timestamp {
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        Timestamp([
            dt.year() as f64,
            dt.month() as f64,
            dt.day() as f64,
            dt.hour() as f64,
            dt.minute() as f64,
            dt.second() as f64,
        ])
    }

    pub fn year(&self) -> f64 {
        self.0[0]
    }

    pub fn as_array(&self) -> &[f64; 6] {
        &self.0
    }

    /// Bitwise comparison against a stored record
    pub fn matches(&self, stored: &[f64]) -> bool {
        stored.len() == 6
            && self
                .0
                .iter()
                .zip(stored)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [y, mo, d, h, mi, s] = self.0;
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            y, mo, d, h, mi, s
        )
    }
}

/// Dates from `start` through `start + n_days`, inclusive
pub fn date_range(start: NaiveDate, n_days: u32) -> Vec<NaiveDate> {
    (0..=n_days as i64)
        .map(|offset| start + Duration::days(offset))
        .collect()
}

/// Lowercase `ddmonyy` stamp, e.g. `04jan20`
pub fn ddmonyy(date: NaiveDate) -> String {
    date.format("%d%b%y").to_string().to_lowercase()
}

/// Output folder name for a processed date range, e.g. `04jan20-05jan20`
pub fn folder_name(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}-{}", ddmonyy(start), ddmonyy(end))
}

/// Format a wall-clock duration as `HH:MM:SS`
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Decode CF-convention time values (`<unit> since <reference>`)
///
/// Values are rounded to whole seconds.
pub fn decode_cf_times(values: &[f64], units: &str) -> Result<Vec<NaiveDateTime>> {
    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| ForcingError::Source(format!("Unrecognised time units: {}", units)))?;

    let scale = match unit.trim().to_lowercase().as_str() {
        "seconds" | "second" | "secs" | "s" => 1.0,
        "minutes" | "minute" | "mins" => 60.0,
        "hours" | "hour" | "hrs" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        other => {
            return Err(ForcingError::Source(format!(
                "Unsupported time unit '{}' in '{}'",
                other, units
            )))
        }
    };
    let origin = parse_reference(reference.trim())?;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return Err(ForcingError::Source(format!(
                    "Non-finite time value {} ({})",
                    v, units
                )));
            }
            let seconds = (v * scale).round() as i64;
            Ok(origin + Duration::seconds(seconds))
        })
        .collect()
}

/// Parse the reference instant of a CF time unit string
///
/// References carrying a UTC offset are converted to UTC.
fn parse_reference(reference: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(reference) {
        return Ok(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(reference, format) {
            return Ok(dt.naive_utc());
        }
    }
    let cleaned = reference.trim_end_matches('Z').trim_end_matches(" UTC");
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(cleaned, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ForcingError::Source(format!("Could not parse time reference: {}", reference)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name(ymd(2020, 1, 4), ymd(2020, 1, 5)), "04jan20-05jan20");
        assert_eq!(folder_name(ymd(2017, 11, 21), ymd(2017, 11, 28)), "21nov17-28nov17");
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let dates = date_range(ymd(2020, 2, 28), 2);
        assert_eq!(dates, vec![ymd(2020, 2, 28), ymd(2020, 2, 29), ymd(2020, 3, 1)]);
        assert_eq!(date_range(ymd(2020, 1, 4), 0).len(), 1);
    }

    #[test]
    fn test_decode_seconds_since() {
        let times = decode_cf_times(&[0.0, 1800.0], "seconds since 1900-01-01 00:00:00").unwrap();
        assert_eq!(times[1], ymd(1900, 1, 1).and_hms_opt(0, 30, 0).unwrap());
    }

    #[test]
    fn test_decode_iso_reference_with_zulu() {
        let times = decode_cf_times(&[1.5], "days since 2020-01-04T00:00:00Z").unwrap();
        assert_eq!(times[0], ymd(2020, 1, 5).and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_fractional_second_reference() {
        let times = decode_cf_times(&[3600.0], "seconds since 1900-01-01 00:00:00.0").unwrap();
        assert_eq!(times[0], ymd(1900, 1, 1).and_hms_opt(1, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_reference_with_offset() {
        let times = decode_cf_times(&[0.0], "hours since 2020-01-04T00:00:00+00:00").unwrap();
        assert_eq!(times[0], ymd(2020, 1, 4).and_hms_opt(0, 0, 0).unwrap());
        let times = decode_cf_times(&[0.0], "hours since 2020-01-04 02:00:00 +02:00").unwrap();
        assert_eq!(times[0], ymd(2020, 1, 4).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_rejects_unknown_units() {
        assert!(decode_cf_times(&[1.0], "fortnights since 2020-01-01").is_err());
        assert!(decode_cf_times(&[1.0], "hours").is_err());
    }

    #[test]
    fn test_timestamp_components() {
        let dt = ymd(2020, 1, 4).and_hms_opt(23, 30, 15).unwrap();
        let stamp = Timestamp::from_datetime(&dt);
        assert_eq!(stamp.0, [2020.0, 1.0, 4.0, 23.0, 30.0, 15.0]);
        assert_eq!(stamp.year(), 2020.0);
        assert_eq!(stamp.to_string(), "2020-01-04 23:30:15");
    }

    #[test]
    fn test_timestamp_matches_is_bitwise() {
        let stamp = Timestamp([2020.0, 1.0, 4.0, 0.0, 0.0, 0.0]);
        assert!(stamp.matches(&[2020.0, 1.0, 4.0, 0.0, 0.0, 0.0]));
        assert!(!stamp.matches(&[2020.0, 1.0, 4.0, 0.0, 0.0, -0.0]));
        assert!(!stamp.matches(&[2020.0, 1.0, 4.0]));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(std::time::Duration::from_secs(3725)), "01:02:05");
    }
}
