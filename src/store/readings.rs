//! Glucose reading store
//!
//! Holds the raw reading sequence and answers windowed views by a rolling
//! duration cutoff. Source order is preserved; readings are assumed
//! pre-sorted by the backend.

use chrono::{DateTime, Duration, Utc};

use crate::model::GlucoseReading;

/// Window sizes offered by the dashboard, in hours
pub const WINDOW_HOURS: [f64; 5] = [1.0, 3.0, 6.0, 12.0, 24.0];

/// In-memory store for the fetched glucose reading sequence
#[derive(Debug, Default)]
pub struct TimeSeriesStore {
    readings: Vec<GlucoseReading>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored readings
    pub fn load(&mut self, readings: Vec<GlucoseReading>) {
        self.readings = readings;
    }

    /// All readings, in source order
    pub fn all(&self) -> &[GlucoseReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings within the trailing window ending at `now`
    ///
    /// Returns every reading with `timestamp > now - hours` (strict, open
    /// lower bound), preserving source order. The dashboard constrains
    /// `hours` to `WINDOW_HOURS`, but any positive value is accepted;
    /// non-positive windows yield nothing.
    pub fn windowed(&self, hours: f64, now: DateTime<Utc>) -> Vec<GlucoseReading> {
        if hours <= 0.0 {
            return Vec::new();
        }
        let cutoff = now - Duration::milliseconds((hours * 3_600_000.0).round() as i64);
        self.readings
            .iter()
            .filter(|r| r.timestamp > cutoff)
            .copied()
            .collect()
    }
}
