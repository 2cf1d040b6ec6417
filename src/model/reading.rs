//! Glucose readings
//!
//! A reading is immutable once fetched. The wire record carries an
//! `event_type` tag (always `"glucose"` in practice) which is dropped on
//! ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single glucose measurement at a point in time, in mg/dL
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    #[serde(with = "super::time::flexible_utc")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl GlucoseReading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_roundtrip() {
        let reading = GlucoseReading::new(
            super::super::parse_timestamp("2024-03-01T08:00:00Z").unwrap(),
            112.0,
        );
        let json = serde_json::to_string(&reading).unwrap();
        let restored: GlucoseReading = serde_json::from_str(&json).unwrap();
        assert_eq!(reading, restored);
    }
}
