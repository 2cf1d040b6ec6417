//! Request/response wire shapes for the remote store
//!
//! Events serialize through their own wire form (see `model::event`); these
//! are the remaining envelope types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Event, GlucoseReading, NutritionFacts};

/// Wire record for `GET /glucose/`
#[derive(Debug, Deserialize)]
pub(crate) struct GlucoseRecord {
    #[serde(with = "crate::model::time::flexible_utc")]
    pub timestamp: DateTime<Utc>,
    #[allow(dead_code)]
    #[serde(default)]
    pub event_type: Option<String>,
    pub glucose_value: f64,
}

impl From<GlucoseRecord> for GlucoseReading {
    fn from(record: GlucoseRecord) -> Self {
        GlucoseReading::new(record.timestamp, record.glucose_value)
    }
}

/// Body for `POST /consequence/upload/`
#[derive(Debug, Serialize)]
pub(crate) struct ConsequenceUpload<'a> {
    pub event: &'a Event,
    pub consequence: &'a str,
}

/// Body for `POST /consequence/recommendation-prompt/`
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationQuery {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "crate::model::time::flexible_utc")]
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: Value,
}

impl RecommendationQuery {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            timestamp: Utc::now(),
            description: None,
            data: Value::Object(Default::default()),
        }
    }

    /// Builder: set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder: add an attribute to the data object
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.data {
            map.insert(key.into(), value.into());
        }
        self
    }
}

/// Envelope for the recommendation response: the payload arrives as a JSON
/// string nested inside `result`
#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationEnvelope {
    pub result: String,
}

/// A consequence recommendation from the remote advisor
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Recommendation {
    /// Short advisory text
    pub detail: String,
    /// Past observations supporting the advice
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Envelope for `POST /upload-image/`
#[derive(Debug, Deserialize)]
pub(crate) struct ImageEnvelope {
    pub data: NutritionFacts,
}
