use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid timestamp '{0}'. Use YYYY-MM-DD or an ISO 8601 date-time.")]
pub struct ParseTimestampError(pub String);

/// An ISO 8601 instant that also knows the calendar day it was written on.
///
/// Date-only and offset-less inputs are read as UTC. Ordering, equality and
/// [`Timestamp::day_key`] all follow the UTC instant; the written offset is
/// only kept for display.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().fixed_offset())
    }

    /// Midnight UTC of `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
    }

    pub fn from_naive_utc(datetime: NaiveDateTime) -> Self {
        Self(datetime.and_utc().fixed_offset())
    }

    /// The UTC calendar day used to deduplicate records.
    ///
    /// Equal instants always share a day, so a day-keyed collection sorted by
    /// instant is strictly ascending.
    pub fn day_key(&self) -> NaiveDate {
        self.to_utc().date_naive()
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }
}

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt));
        }
        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self::from_naive_utc(dt));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| ParseTimestampError(s.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_only() {
        let ts: Timestamp = "2024-01-10".parse().unwrap();
        assert_eq!(ts.day_key(), day(2024, 1, 10));
        assert_eq!(ts.to_string(), "2024-01-10T00:00:00+00:00");
    }

    #[test]
    fn test_parse_minutes_without_offset() {
        let ts: Timestamp = "2024-01-10T10:00".parse().unwrap();
        let later: Timestamp = "2024-01-10T12:00".parse().unwrap();
        assert_eq!(ts.day_key(), day(2024, 1, 10));
        assert!(later > ts);
    }

    #[test]
    fn test_parse_rfc3339_day_follows_utc() {
        let ts: Timestamp = "2024-01-10T23:30:00-05:00".parse().unwrap();
        assert_eq!(ts.day_key(), day(2024, 1, 11));
        assert_eq!(ts.to_string(), "2024-01-10T23:30:00-05:00");
    }

    #[test]
    fn test_equal_instants_different_offsets() {
        let a: Timestamp = "2024-01-10T10:00:00Z".parse().unwrap();
        let b: Timestamp = "2024-01-10T11:00:00+01:00".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.day_key(), b.day_key());

        let late: Timestamp = "2024-01-10T23:00:00-01:00".parse().unwrap();
        let midnight: Timestamp = "2024-01-11T00:00:00+00:00".parse().unwrap();
        assert_eq!(late, midnight);
        assert_eq!(late.day_key(), midnight.day_key());
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<Timestamp>().is_err());
        assert!("yesterday".parse::<Timestamp>().is_err());
        assert!("2024-13-01".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_json_is_rfc3339_string() {
        let ts: Timestamp = "2024-01-10T10:00".parse().unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-10T10:00:00+00:00\"");

        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
        assert!(serde_json::from_str::<Timestamp>("\"soon\"").is_err());
    }
}
