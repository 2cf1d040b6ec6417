//! Dashboard session
//!
//! Composition root for one UI session: owns the stores and the selector,
//! runs the concurrent startup fetch, and wraps every remote operation so
//! that failures become transient status messages instead of propagating.
//! A failed fetch never prevents the session from starting.

use std::sync::Arc;

use chrono::Utc;

use crate::client::{Recommendation, RecommendationQuery, RemoteStore};
use crate::detect::{detect_catalog, DetectionConfig};
use crate::model::{Event, EventDraft, GlucoseReading, NutritionFacts};
use crate::select::{CommitOutcome, CommitStatus, RangeSelector};
use crate::store::{EventIndex, TimeSeriesStore};

/// Severity of a transient status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Error,
    Success,
}

/// A user-visible, non-fatal message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// One dashboard session over a remote store
pub struct Session {
    store: Arc<dyn RemoteStore>,
    readings: TimeSeriesStore,
    events: EventIndex,
    selector: Option<RangeSelector>,
    status: Option<StatusMessage>,
    loading: bool,
}

impl Session {
    /// Start a session: fetch readings, events, and the catalog concurrently
    ///
    /// Each fetch fails independently; failures are logged and surfaced as a
    /// status message, and the session starts with whatever data arrived.
    pub async fn start(store: Arc<dyn RemoteStore>) -> Self {
        let mut session = Self {
            store: store.clone(),
            readings: TimeSeriesStore::new(),
            events: EventIndex::new(store.clone()),
            selector: None,
            status: None,
            loading: true,
        };

        let (readings, events, catalog) = tokio::join!(
            store.fetch_readings(),
            store.fetch_events(),
            store.fetch_catalog(),
        );

        match readings {
            Ok(readings) => session.readings.load(readings),
            Err(e) => {
                tracing::warn!("Failed to fetch glucose readings: {}", e);
                session.set_error(format!("Could not load glucose readings: {}", e));
            }
        }

        match events {
            Ok(events) => session.events.load(events),
            Err(e) => {
                tracing::warn!("Failed to fetch events: {}", e);
                session.set_error(format!("Could not load events: {}", e));
            }
        }

        match catalog {
            Ok(catalog) => session.selector = Some(RangeSelector::new(catalog)),
            Err(e) => {
                tracing::warn!("Failed to fetch interesting events: {}", e);
                session.set_error(format!("Could not load interesting events: {}", e));
            }
        }

        session.loading = false;
        session
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn readings(&self) -> &TimeSeriesStore {
        &self.readings
    }

    pub fn events(&self) -> &EventIndex {
        &self.events
    }

    pub fn selector(&self) -> Option<&RangeSelector> {
        self.selector.as_ref()
    }

    pub fn selector_mut(&mut self) -> Option<&mut RangeSelector> {
        self.selector.as_mut()
    }

    /// Current status message, if any
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Take and clear the status message
    pub fn take_status(&mut self) -> Option<StatusMessage> {
        self.status.take()
    }

    fn set_error(&mut self, text: String) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Error,
            text,
        });
    }

    fn set_success(&mut self, text: String) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Success,
            text,
        });
    }

    /// Readings within the trailing window ending now
    pub fn windowed(&self, hours: f64) -> Vec<GlucoseReading> {
        self.readings.windowed(hours, Utc::now())
    }

    /// Rebuild the selector from a locally detected catalog
    ///
    /// Used when the backend's catalog is unavailable or when thresholds
    /// are tuned client-side.
    pub fn detect_locally(&mut self, config: &DetectionConfig) {
        let catalog = detect_catalog(self.readings.all(), self.events.all(), config);
        self.selector = Some(RangeSelector::new(catalog));
    }

    /// Log a new event; failures become a status message
    pub async fn add_event(&mut self, draft: EventDraft) -> Option<Event> {
        match self.events.create(draft).await {
            Ok(event) => {
                self.set_success(format!("Logged {} event #{}", event.kind(), event.id));
                Some(event)
            }
            Err(e) => {
                tracing::warn!("Failed to create event: {}", e);
                self.set_error(format!("Could not save event: {}", e));
                None
            }
        }
    }

    /// Delete an event; failures become a status message
    pub async fn delete_event(&mut self, id: i64) -> bool {
        match self.events.remove(id).await {
            Ok(()) => {
                self.set_success(format!("Deleted event #{}", id));
                true
            }
            Err(e) => {
                tracing::warn!("Failed to delete event {}: {}", id, e);
                self.set_error(format!("Could not delete event: {}", e));
                false
            }
        }
    }

    /// Upload consequence annotations for the selected events
    ///
    /// The status message reflects the aggregate outcome, not the button
    /// label.
    pub async fn remember_selected(&mut self, consequence: &str) -> Option<CommitOutcome> {
        let selector = self.selector.as_mut()?;
        let outcome = selector.commit(self.store.as_ref(), consequence).await?;

        match outcome.status() {
            CommitStatus::AllSucceeded => {
                self.set_success(format!("Remembered {} events", outcome.succeeded()))
            }
            CommitStatus::Partial => self.set_error(format!(
                "Remembered {} events, {} failed",
                outcome.succeeded(),
                outcome.failed()
            )),
            CommitStatus::AllFailed => {
                self.set_error("Could not remember the selected events".to_string())
            }
        }
        Some(outcome)
    }

    /// Ask the remote advisor for a consequence recommendation
    pub async fn recommend(&mut self, query: &RecommendationQuery) -> Option<Recommendation> {
        match self.store.recommend(query).await {
            Ok(rec) => Some(rec),
            Err(e) => {
                tracing::warn!("Recommendation request failed: {}", e);
                self.set_error(format!("Could not get a recommendation: {}", e));
                None
            }
        }
    }

    /// Send a food photo to the remote classifier
    pub async fn analyze_photo(
        &mut self,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    ) -> Option<NutritionFacts> {
        match self
            .store
            .analyze_photo(file_name, content_type, bytes)
            .await
        {
            Ok(facts) => Some(facts),
            Err(e) => {
                tracing::warn!("Photo analysis failed: {}", e);
                self.set_error("Failed to fetch nutritional information. Please try again.".to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeStore;
    use crate::model::{parse_timestamp, EventCatalog, EventPayload, EventRange, TimeSpan};

    fn reading(ts: &str, value: f64) -> GlucoseReading {
        GlucoseReading::new(parse_timestamp(ts).unwrap(), value)
    }

    fn event(id: i64, kind: &str, ts: &str) -> Event {
        Event {
            id,
            timestamp: parse_timestamp(ts).unwrap(),
            description: None,
            payload: EventPayload::from_wire(kind, Some(serde_json::json!({}))),
        }
    }

    fn populated_store() -> FakeStore {
        let mut store = FakeStore::new();
        store.readings = vec![
            reading("2024-03-01T08:00:00", 110.0),
            reading("2024-03-01T08:05:00", 190.0),
        ];
        store.events = vec![event(1, "food", "2024-03-01T07:30:00")];
        let mut catalog = EventCatalog::new();
        catalog.insert(
            "hyperglycemic",
            vec![EventRange {
                span: TimeSpan::new(
                    parse_timestamp("2024-03-01T08:05:00").unwrap(),
                    parse_timestamp("2024-03-01T08:30:00").unwrap(),
                ),
                events: vec![event(1, "food", "2024-03-01T07:30:00")],
            }],
        );
        store.catalog = catalog;
        store
    }

    #[tokio::test]
    async fn test_start_populates_all_stores() {
        let session = Session::start(Arc::new(populated_store())).await;

        assert!(!session.is_loading());
        assert_eq!(session.readings().len(), 2);
        assert_eq!(session.events().len(), 1);
        assert_eq!(
            session.selector().unwrap().active_category(),
            Some("hyperglycemic")
        );
        assert!(session.status().is_none());
    }

    #[tokio::test]
    async fn test_start_survives_fetch_failures() {
        let mut store = FakeStore::new();
        store.fail_fetches = true;
        let mut session = Session::start(Arc::new(store)).await;

        // Loading flag reset, stores empty, a transient error surfaced.
        assert!(!session.is_loading());
        assert!(session.readings().is_empty());
        assert!(session.events().is_empty());
        assert!(session.selector().is_none());
        let status = session.take_status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(session.status().is_none());
    }

    #[tokio::test]
    async fn test_add_event_failure_sets_status_only() {
        let mut store = populated_store();
        store.fail_writes = true;
        let mut session = Session::start(Arc::new(store)).await;

        let draft = EventDraft::new(EventPayload::Insulin { units: 2.0 });
        assert!(session.add_event(draft).await.is_none());
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.status().unwrap().kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn test_remember_selected_reports_aggregate() {
        let session_store = Arc::new(populated_store());
        let mut session = Session::start(session_store.clone()).await;

        let selector = session.selector_mut().unwrap();
        selector.select_range(0);
        selector.toggle_event(0);

        let outcome = session.remember_selected("hyperglycemia").await.unwrap();
        assert_eq!(outcome.status(), CommitStatus::AllSucceeded);
        assert_eq!(session.status().unwrap().kind, StatusKind::Success);
        assert_eq!(session_store.consequences.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detect_locally_rebuilds_selector() {
        let mut store = populated_store();
        // No catalog from the backend this time.
        store.catalog = EventCatalog::new();
        let mut session = Session::start(Arc::new(store)).await;
        assert_eq!(session.selector().unwrap().active_category(), None);

        let config = DetectionConfig {
            lookback_minutes: 40,
            ..DetectionConfig::default()
        };
        session.detect_locally(&config);

        let selector = session.selector().unwrap();
        assert_eq!(selector.active_category(), Some("hyperglycemic"));
    }

    #[tokio::test]
    async fn test_windowed_view() {
        let mut store = FakeStore::new();
        store.readings = vec![
            reading("2024-03-01T08:00:00", 110.0), // far in the past
        ];
        let session = Session::start(Arc::new(store)).await;
        assert!(session.windowed(1.0).is_empty());
    }
}
