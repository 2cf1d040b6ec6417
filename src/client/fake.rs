//! In-memory `RemoteStore` fake for tests
//!
//! Serves canned data and records every write, with per-operation failure
//! switches so tests can simulate a dead or flaky backend.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FetchError, Recommendation, RecommendationQuery, RemoteStore, RemoteWriteError};
use crate::model::{Event, EventCatalog, GlucoseReading, NutritionFacts};

#[derive(Default)]
pub(crate) struct FakeStore {
    pub readings: Vec<GlucoseReading>,
    pub events: Vec<Event>,
    pub catalog: EventCatalog,
    pub fail_fetches: bool,
    pub fail_writes: bool,
    /// Event ids whose consequence upload fails
    pub fail_consequence_for: HashSet<i64>,
    next_id: AtomicI64,
    pub created: Mutex<Vec<Event>>,
    pub deleted: Mutex<Vec<i64>>,
    pub consequences: Mutex<Vec<(i64, String)>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn fetch_readings(&self) -> Result<Vec<GlucoseReading>, FetchError> {
        if self.fail_fetches {
            return Err(FetchError::Unavailable);
        }
        Ok(self.readings.clone())
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, FetchError> {
        if self.fail_fetches {
            return Err(FetchError::Unavailable);
        }
        Ok(self.events.clone())
    }

    async fn fetch_catalog(&self) -> Result<EventCatalog, FetchError> {
        if self.fail_fetches {
            return Err(FetchError::Unavailable);
        }
        Ok(self.catalog.clone())
    }

    async fn create_event(&self, event: &Event) -> Result<Event, RemoteWriteError> {
        if self.fail_writes {
            return Err(RemoteWriteError::Unavailable);
        }
        let mut created = event.clone();
        created.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_event(&self, id: i64) -> Result<(), RemoteWriteError> {
        if self.fail_writes {
            return Err(RemoteWriteError::Unavailable);
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn record_consequence(
        &self,
        event: &Event,
        consequence: &str,
    ) -> Result<(), RemoteWriteError> {
        if self.fail_writes || self.fail_consequence_for.contains(&event.id) {
            return Err(RemoteWriteError::Unavailable);
        }
        self.consequences
            .lock()
            .unwrap()
            .push((event.id, consequence.to_string()));
        Ok(())
    }

    async fn recommend(
        &self,
        _query: &RecommendationQuery,
    ) -> Result<Recommendation, RemoteWriteError> {
        if self.fail_writes {
            return Err(RemoteWriteError::Unavailable);
        }
        Ok(Recommendation {
            detail: "Based on your historical data, this will likely raise glucose.".to_string(),
            sources: vec![],
        })
    }

    async fn analyze_photo(
        &self,
        _file_name: String,
        _content_type: String,
        _bytes: Vec<u8>,
    ) -> Result<NutritionFacts, RemoteWriteError> {
        if self.fail_writes {
            return Err(RemoteWriteError::Unavailable);
        }
        Ok(NutritionFacts {
            calories: Some(250.0),
            carbohydrate: Some(30.0),
            ..Default::default()
        })
    }
}
