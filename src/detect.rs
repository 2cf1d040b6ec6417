//! Interesting-range detection
//!
//! Client-side computation of the event catalog from raw readings and
//! events, mirroring the backend's `/interesting-events` classification:
//! hyperglycemic and hypoglycemic episodes by level threshold, and
//! quickly-raising / quickly-dropping episodes by consecutive-sample rate.
//!
//! A detected episode is usually caused by an event some minutes before its
//! onset, so attribution shifts each span back by a lookback window before
//! matching event timestamps, and reports the original span.

use chrono::Duration;
use serde::Deserialize;

use crate::model::{Event, EventCatalog, EventRange, GlucoseReading, TimeSpan};

/// Sample interval of the glucose feed, minutes. Rate thresholds are given
/// in mg/dL/min and scaled by this before comparison against consecutive
/// deltas.
const SAMPLE_INTERVAL_MINUTES: f64 = 5.0;

/// Thresholds for episode detection
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Readings above this level are hyperglycemic, mg/dL
    #[serde(default = "default_hyperglycemic")]
    pub hyperglycemic_threshold: f64,

    /// Readings below this level are hypoglycemic, mg/dL
    #[serde(default = "default_hypoglycemic")]
    pub hypoglycemic_threshold: f64,

    /// Rate threshold for quickly-raising episodes, mg/dL/min
    #[serde(default = "default_rate")]
    pub raising_threshold: f64,

    /// Rate threshold for quickly-dropping episodes, mg/dL/min
    #[serde(default = "default_rate")]
    pub dropping_threshold: f64,

    /// How far before an episode to look for cause events, minutes
    #[serde(default = "default_lookback")]
    pub lookback_minutes: i64,
}

fn default_hyperglycemic() -> f64 {
    180.0
}

fn default_hypoglycemic() -> f64 {
    70.0
}

fn default_rate() -> f64 {
    2.0
}

fn default_lookback() -> i64 {
    60
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            hyperglycemic_threshold: default_hyperglycemic(),
            hypoglycemic_threshold: default_hypoglycemic(),
            raising_threshold: default_rate(),
            dropping_threshold: default_rate(),
            lookback_minutes: default_lookback(),
        }
    }
}

/// Maximal runs of readings matching a level predicate
///
/// A run closes at the first non-matching reading, whose timestamp ends the
/// span. A run still open at end-of-data is discarded.
fn level_spans(readings: &[GlucoseReading], matches: impl Fn(f64) -> bool) -> Vec<TimeSpan> {
    let mut spans = Vec::new();
    let mut start = None;
    for reading in readings {
        if matches(reading.value) {
            start.get_or_insert(reading.timestamp);
        } else if let Some(s) = start.take() {
            spans.push(TimeSpan::new(s, reading.timestamp));
        }
    }
    spans
}

/// Spans where readings exceed the hyperglycemic threshold
pub fn hyperglycemic_spans(readings: &[GlucoseReading], threshold: f64) -> Vec<TimeSpan> {
    level_spans(readings, |v| v > threshold)
}

/// Spans where readings fall below the hypoglycemic threshold
pub fn hypoglycemic_spans(readings: &[GlucoseReading], threshold: f64) -> Vec<TimeSpan> {
    level_spans(readings, |v| v < threshold)
}

/// Runs of consecutive deltas exceeding a scaled rate threshold
///
/// The span opens at the reading before the first exceeding delta and closes
/// at the first reading that breaks the run.
fn rate_spans(readings: &[GlucoseReading], per_minute: f64, delta: impl Fn(f64, f64) -> f64) -> Vec<TimeSpan> {
    let scaled = per_minute * SAMPLE_INTERVAL_MINUTES;
    let mut spans = Vec::new();
    let mut start = None;
    for pair in readings.windows(2) {
        if delta(pair[0].value, pair[1].value) > scaled {
            start.get_or_insert(pair[0].timestamp);
        } else if let Some(s) = start.take() {
            spans.push(TimeSpan::new(s, pair[1].timestamp));
        }
    }
    spans
}

/// Spans where glucose rises faster than the threshold rate
pub fn raising_spans(readings: &[GlucoseReading], per_minute: f64) -> Vec<TimeSpan> {
    rate_spans(readings, per_minute, |prev, next| next - prev)
}

/// Spans where glucose drops faster than the threshold rate
pub fn dropping_spans(readings: &[GlucoseReading], per_minute: f64) -> Vec<TimeSpan> {
    rate_spans(readings, per_minute, |prev, next| prev - next)
}

/// All interesting spans, keyed by category in display order
pub fn interesting_spans(
    readings: &[GlucoseReading],
    config: &DetectionConfig,
) -> Vec<(&'static str, Vec<TimeSpan>)> {
    vec![
        (
            "hyperglycemic",
            hyperglycemic_spans(readings, config.hyperglycemic_threshold),
        ),
        (
            "hypoglycemic",
            hypoglycemic_spans(readings, config.hypoglycemic_threshold),
        ),
        (
            "quickly_raising",
            raising_spans(readings, config.raising_threshold),
        ),
        (
            "quickly_dropping",
            dropping_spans(readings, config.dropping_threshold),
        ),
    ]
}

/// Build the interesting-event catalog from raw data
///
/// Each detected span is shifted back by the lookback window for event
/// attribution (inclusive on both ends) and reported with its original
/// endpoints. Spans that attribute no events are omitted; categories are
/// present even when empty.
pub fn detect_catalog(
    readings: &[GlucoseReading],
    events: &[Event],
    config: &DetectionConfig,
) -> EventCatalog {
    let lookback = Duration::minutes(config.lookback_minutes);
    let mut catalog = EventCatalog::new();

    for (key, spans) in interesting_spans(readings, config) {
        let mut ranges = Vec::new();
        for span in spans {
            let window = span.shifted_back(lookback);
            let attributed: Vec<Event> = events
                .iter()
                .filter(|e| window.contains(e.timestamp))
                .cloned()
                .collect();
            if !attributed.is_empty() {
                ranges.push(EventRange {
                    span,
                    events: attributed,
                });
            }
        }
        catalog.insert(key, ranges);
    }

    catalog
}
