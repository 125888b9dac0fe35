//! Calendar-day bounds for filtering transactions by date range
//!
//! Bounds are whole UTC days: `from` starts at 00:00 of its day and `to`
//! includes everything before 00:00 of the following day.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::CoreError;

/// Textual date format used in URLs and filter controls
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Optional inclusive calendar-day range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateBounds {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateBounds {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// True when both bounds are set and `from` is after `to`
    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }

    /// First instant included by the lower bound
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.from.map(start_of_day)
    }

    /// First instant excluded by the upper bound
    pub fn end_exclusive(&self) -> Option<DateTime<Utc>> {
        self.to.map(|d| start_of_day(d) + Duration::hours(24))
    }

    /// Check if an instant falls within the bounds
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        let after_start = self.start().map_or(true, |start| *instant >= start);
        let before_end = self.end_exclusive().map_or(true, |end| *instant < end);
        after_start && before_end
    }

    /// Check a raw timestamp string; unparseable timestamps only pass when unbounded
    pub fn contains_timestamp(&self, timestamp: &str) -> bool {
        if self.is_unbounded() {
            return true;
        }
        match parse_timestamp(timestamp) {
            Some(instant) => self.contains(&instant),
            None => false,
        }
    }

    /// Get a human-readable description of the range
    pub fn description(&self) -> String {
        match (self.from, self.to) {
            (None, None) => "All Time".to_string(),
            (Some(from), None) => format!("From {}", from.format(DATE_FORMAT)),
            (None, Some(to)) => format!("Until {}", to.format(DATE_FORMAT)),
            (Some(from), Some(to)) => {
                format!("{} to {}", from.format(DATE_FORMAT), to.format(DATE_FORMAT))
            }
        }
    }
}

/// Midnight UTC of the given day
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| CoreError::Validation {
        field: field.to_string(),
        message: format!("'{}' is not a {} date: {}", value, DATE_FORMAT, e),
    })
}

/// Format a calendar date in the URL format
pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a record timestamp
///
/// Accepts RFC 3339 (with offset), a naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// (taken as UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .map(start_of_day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_upper_bound_includes_whole_day() {
        let bounds = DateBounds::new(None, Some(date("2024-01-05")));
        assert!(bounds.contains_timestamp("2024-01-05T23:59:00"));
        assert!(!bounds.contains_timestamp("2024-01-06T00:00:00"));
    }

    #[test]
    fn test_lower_bound_starts_at_midnight() {
        let bounds = DateBounds::new(Some(date("2024-01-05")), None);
        assert!(bounds.contains_timestamp("2024-01-05T00:00:00Z"));
        assert!(!bounds.contains_timestamp("2024-01-04T23:59:59.999Z"));
    }

    #[test]
    fn test_offsets_are_normalized() {
        let bounds = DateBounds::new(Some(date("2024-01-05")), Some(date("2024-01-05")));
        // 01:00 at +02:00 is 23:00 UTC the previous day
        assert!(!bounds.contains_timestamp("2024-01-05T01:00:00+02:00"));
        assert!(bounds.contains_timestamp("2024-01-05T12:00:00+02:00"));
    }

    #[test]
    fn test_unparseable_timestamp() {
        let unbounded = DateBounds::default();
        assert!(unbounded.contains_timestamp("yesterday"));

        let bounded = DateBounds::new(Some(date("2024-01-01")), None);
        assert!(!bounded.contains_timestamp("yesterday"));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let bounds = DateBounds::new(Some(date("2024-02-01")), Some(date("2024-01-01")));
        assert!(bounds.is_inverted());
        assert!(!bounds.contains_timestamp("2024-01-15T12:00:00Z"));
        assert!(!bounds.contains_timestamp("2024-02-01T12:00:00Z"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("dateFrom", "2024-03-09").unwrap(), date("2024-03-09"));
        let err = parse_date("dateFrom", "09/03/2024").unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "dateFrom"));
        assert!(parse_date("dateTo", "2024-02-30").is_err());
    }

    #[test]
    fn test_description() {
        assert_eq!(DateBounds::default().description(), "All Time");
        let bounds = DateBounds::new(Some(date("2024-01-01")), Some(date("2024-12-31")));
        assert_eq!(bounds.description(), "2024-01-01 to 2024-12-31");
    }
}
