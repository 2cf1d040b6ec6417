//! Logged events
//!
//! An event is a discrete occurrence (insulin dose, food intake, exercise,
//! or a free-form entry) with a timestamp and a typed payload. The wire
//! format is `{id, type, timestamp, data, description}` with `data` keyed by
//! `type`; the loose `data` object becomes a tagged `EventPayload` on
//! ingestion, with unknown or malformed payloads explicitly quarantined in
//! `EventPayload::Other` rather than passed through untyped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::nutrition::NutritionFacts;
use super::time::flexible_utc;

/// Typed event payload, tagged by the wire `type` field
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// An insulin dose
    Insulin { units: f64 },
    /// A food intake with its nutrient breakdown
    Food(NutritionFacts),
    /// An exercise session
    Exercise {
        calories: f64,
        duration: f64,
        distance: Option<f64>,
    },
    /// Free-form entries, and known types whose data failed strict parsing.
    /// The raw payload is preserved for display and re-upload.
    Other { kind: String, data: Value },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct InsulinData {
    units: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ExerciseData {
    calories: f64,
    duration: f64,
    #[serde(default)]
    distance: Option<f64>,
}

impl EventPayload {
    /// Build a payload from the wire `type` tag and `data` object
    ///
    /// Known types parse strictly; on failure the payload lands in `Other`
    /// with the type tag and raw data intact.
    pub fn from_wire(kind: &str, data: Option<Value>) -> Self {
        let raw = data.unwrap_or(Value::Null);
        match kind {
            "insulin" => match serde_json::from_value::<InsulinData>(raw.clone()) {
                Ok(d) => EventPayload::Insulin { units: d.units },
                Err(_) => EventPayload::Other {
                    kind: kind.to_string(),
                    data: raw,
                },
            },
            "food" => match serde_json::from_value::<NutritionFacts>(raw.clone()) {
                Ok(facts) => EventPayload::Food(facts),
                Err(_) => EventPayload::Other {
                    kind: kind.to_string(),
                    data: raw,
                },
            },
            "exercise" => match serde_json::from_value::<ExerciseData>(raw.clone()) {
                Ok(d) => EventPayload::Exercise {
                    calories: d.calories,
                    duration: d.duration,
                    distance: d.distance,
                },
                Err(_) => EventPayload::Other {
                    kind: kind.to_string(),
                    data: raw,
                },
            },
            _ => EventPayload::Other {
                kind: kind.to_string(),
                data: raw,
            },
        }
    }

    /// The wire `type` tag for this payload
    pub fn kind(&self) -> &str {
        match self {
            EventPayload::Insulin { .. } => "insulin",
            EventPayload::Food(_) => "food",
            EventPayload::Exercise { .. } => "exercise",
            EventPayload::Other { kind, .. } => kind,
        }
    }

    /// The wire `data` object for this payload
    pub fn to_data(&self) -> Value {
        match self {
            EventPayload::Insulin { units } => serde_json::json!({ "units": units }),
            EventPayload::Food(facts) => {
                serde_json::to_value(facts).unwrap_or(Value::Null)
            }
            EventPayload::Exercise {
                calories,
                duration,
                distance,
            } => {
                let mut data = serde_json::json!({
                    "calories": calories,
                    "duration": duration,
                });
                if let Some(d) = distance {
                    data["distance"] = serde_json::json!(d);
                }
                data
            }
            EventPayload::Other { data, .. } => data.clone(),
        }
    }

    /// True for a known type whose data failed strict parsing
    pub fn is_quarantined(&self) -> bool {
        matches!(
            self,
            EventPayload::Other { kind, .. }
                if matches!(kind.as_str(), "insulin" | "food" | "exercise")
        )
    }
}

/// A logged occurrence with identity, timestamp, and typed payload
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Unique identifier. Server-assigned; when absent on the wire, falls
    /// back to a current-time-derived integer (the original client's
    /// optimistic id scheme).
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
    pub payload: EventPayload,
}

impl Event {
    /// The wire `type` tag
    pub fn kind(&self) -> &str {
        self.payload.kind()
    }

    /// Description for display, `"NA"` when absent
    pub fn description_or_na(&self) -> &str {
        self.description.as_deref().unwrap_or("NA")
    }
}

/// Wire shape of an event record
#[derive(Serialize, Deserialize)]
struct WireEvent {
    #[serde(default)]
    id: Option<i64>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(with = "flexible_utc")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        WireEvent {
            id: Some(self.id),
            kind: self.payload.kind().to_string(),
            timestamp: self.timestamp,
            data: Some(self.payload.to_data()),
            description: self.description.clone(),
        }
        .serialize(ser)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let wire = WireEvent::deserialize(de)?;
        Ok(Event {
            id: wire.id.unwrap_or_else(|| wire.timestamp.timestamp_millis()),
            timestamp: wire.timestamp,
            description: wire.description,
            payload: EventPayload::from_wire(&wire.kind, wire.data),
        })
    }
}

/// Client-side creation request
///
/// The index stamps the timestamp and a provisional id at submit time; the
/// server assigns the canonical id.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub description: Option<String>,
    pub payload: EventPayload,
}

impl EventDraft {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            description: None,
            payload,
        }
    }

    /// Builder: set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Materialize into an optimistic event at the given instant
    pub fn into_event(self, now: DateTime<Utc>) -> Event {
        Event {
            id: now.timestamp_millis(),
            timestamp: now,
            description: self.description,
            payload: self.payload,
        }
    }
}
