//! Timestamp parsing and interval types
//!
//! The remote store emits ISO-8601 timestamps in UTC, sometimes without an
//! explicit offset. Parsing accepts both forms and the same parse is used for
//! comparison and display, so windowing, sorting, and rendering never
//! disagree about what a timestamp means.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Parse an ISO-8601 timestamp, assuming UTC when no offset is present.
///
/// Accepts RFC 3339 (`2024-03-01T08:00:00Z`, with offset) and naive
/// `%Y-%m-%dT%H:%M:%S` with optional fractional seconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Split a timestamp into display date and time parts on the `T` separator.
pub fn split_date_time(ts: &DateTime<Utc>) -> (String, String) {
    (
        ts.format("%Y-%m-%d").to_string(),
        ts.format("%H:%M:%S").to_string(),
    )
}

/// Serde adapter for timestamps that may arrive without an offset.
///
/// Use with `#[serde(with = "crate::model::time::flexible_utc")]`.
pub mod flexible_utc {
    use super::*;
    use serde::{de::Error, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

/// A labeled time interval with `start <= end`
///
/// Endpoints are normalized on construction; containment is inclusive on
/// both ends, matching how the classification source attributes events.
/// On the wire a span is a two-element array of timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    /// Create a span, swapping endpoints if given in reverse order
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Check if a timestamp falls within this span (inclusive)
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Shift both endpoints earlier by the given duration
    pub fn shifted_back(&self, by: chrono::Duration) -> Self {
        Self {
            start: self.start - by,
            end: self.end - by,
        }
    }

    /// Duration covered by this span
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

impl Serialize for TimeSpan {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        [self.start.to_rfc3339(), self.end.to_rfc3339()].serialize(ser)
    }
}

impl<'de> Deserialize<'de> for TimeSpan {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let [start, end] = <[String; 2]>::deserialize(de)?;
        let start = parse_timestamp(&start)
            .ok_or_else(|| D::Error::custom(format!("invalid span start: {}", start)))?;
        let end = parse_timestamp(&end)
            .ok_or_else(|| D::Error::custom(format!("invalid span end: {}", end)))?;
        Ok(TimeSpan::new(start, end))
    }
}
