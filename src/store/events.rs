//! Event index
//!
//! The single owned event list. Reads (`by_kind`, `sorted_by_recency`,
//! `unique_kinds`) are pure and operate on defensive copies; `create` and
//! `remove` are the only operations that talk to the remote store, and local
//! state only changes after the remote write succeeds.

use std::sync::Arc;

use chrono::Utc;

use crate::client::{RemoteStore, RemoteWriteError};
use crate::model::{Event, EventDraft};

/// Sentinel accepted by [`EventIndex::by_kind`] meaning "no filter"
pub const ALL_KINDS: &str = "all";

/// In-memory index over the fetched event list
pub struct EventIndex {
    store: Arc<dyn RemoteStore>,
    events: Vec<Event>,
}

impl EventIndex {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            events: Vec::new(),
        }
    }

    /// Replace the stored events
    pub fn load(&mut self, events: Vec<Event>) {
        self.events = events;
    }

    /// All events, in source order
    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events matching a type tag
    ///
    /// `None` and the `"all"` sentinel return every event; otherwise an
    /// exact-match filter. Input order is preserved — no implicit sort.
    pub fn by_kind(&self, filter: Option<&str>) -> Vec<Event> {
        match filter {
            None => self.events.clone(),
            Some(kind) if kind == ALL_KINDS => self.events.clone(),
            Some(kind) => self
                .events
                .iter()
                .filter(|e| e.kind() == kind)
                .cloned()
                .collect(),
        }
    }

    /// All events ordered newest-first
    ///
    /// Ties keep their original relative order. Sorts a copy; the index
    /// itself is never reordered by a read.
    pub fn sorted_by_recency(&self) -> Vec<Event> {
        let mut sorted = self.events.clone();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }

    /// Distinct type tags, sorted alphabetically (drives the filter menu)
    pub fn unique_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.events.iter().map(|e| e.kind().to_string()).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Create an event: stamp it, submit to the remote store, then insert
    /// the canonical record locally
    ///
    /// On failure the index is untouched — no optimistic insert survives a
    /// failed write.
    pub async fn create(&mut self, draft: EventDraft) -> Result<Event, RemoteWriteError> {
        let candidate = draft.into_event(Utc::now());
        let created = self.store.create_event(&candidate).await?;
        self.events.push(created.clone());
        Ok(created)
    }

    /// Delete an event remotely, then remove it locally
    ///
    /// On failure local state is unchanged.
    pub async fn remove(&mut self, id: i64) -> Result<(), RemoteWriteError> {
        self.store.delete_event(id).await?;
        self.events.retain(|e| e.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeStore;
    use crate::model::{parse_timestamp, EventPayload};

    fn event(id: i64, kind: &str, ts: &str) -> Event {
        Event {
            id,
            timestamp: parse_timestamp(ts).unwrap(),
            description: None,
            payload: EventPayload::from_wire(kind, Some(serde_json::json!({}))),
        }
    }

    fn index_with(events: Vec<Event>) -> EventIndex {
        let mut index = EventIndex::new(Arc::new(FakeStore::new()));
        index.load(events);
        index
    }

    #[test]
    fn test_by_kind_partitions_events() {
        let index = index_with(vec![
            event(1, "insulin", "2024-03-01T08:00:00"),
            event(2, "food", "2024-03-01T09:00:00"),
            event(3, "insulin", "2024-03-01T10:00:00"),
            event(4, "exercise", "2024-03-01T11:00:00"),
        ]);

        let insulin = index.by_kind(Some("insulin"));
        assert_eq!(insulin.iter().map(|e| e.id).collect::<Vec<_>>(), [1, 3]);

        // The filter and its complement partition the full set.
        let rest: Vec<i64> = index
            .all()
            .iter()
            .filter(|e| e.kind() != "insulin")
            .map(|e| e.id)
            .collect();
        assert_eq!(insulin.len() + rest.len(), index.len());
    }

    #[test]
    fn test_by_kind_all_sentinel_returns_everything() {
        let events = vec![
            event(1, "insulin", "2024-03-01T08:00:00"),
            event(2, "food", "2024-03-01T09:00:00"),
        ];
        let index = index_with(events.clone());

        assert_eq!(index.by_kind(None), events);
        assert_eq!(index.by_kind(Some(ALL_KINDS)), events);
    }

    #[test]
    fn test_sorted_by_recency_is_stable_and_pure() {
        let events = vec![
            event(1, "food", "2024-03-01T08:00:00"),
            event(2, "insulin", "2024-03-01T10:00:00"),
            event(3, "exercise", "2024-03-01T10:00:00"),
            event(4, "food", "2024-03-01T09:00:00"),
        ];
        let index = index_with(events.clone());

        let sorted = index.sorted_by_recency();
        // Equal timestamps keep original relative order (2 before 3).
        assert_eq!(sorted.iter().map(|e| e.id).collect::<Vec<_>>(), [2, 3, 4, 1]);

        // The read did not mutate the index, and repeats agree.
        assert_eq!(index.all(), events.as_slice());
        assert_eq!(index.sorted_by_recency(), sorted);
    }

    #[test]
    fn test_unique_kinds_sorted_deduped() {
        let index = index_with(vec![
            event(1, "insulin", "2024-03-01T08:00:00"),
            event(2, "food", "2024-03-01T09:00:00"),
            event(3, "insulin", "2024-03-01T10:00:00"),
        ]);
        assert_eq!(index.unique_kinds(), ["food", "insulin"]);
    }

    #[tokio::test]
    async fn test_create_inserts_canonical_record() {
        let store = Arc::new(FakeStore::new());
        let mut index = EventIndex::new(store.clone());

        let draft = EventDraft::new(EventPayload::Insulin { units: 4.0 }).description("bolus");
        let created = index.create(draft).await.unwrap();

        // Server-assigned id, present in the filtered view.
        assert_eq!(created.id, 100);
        let insulin = index.by_kind(Some("insulin"));
        assert_eq!(insulin.len(), 1);
        assert_eq!(insulin[0].id, 100);
        assert_eq!(store.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_index_untouched() {
        let mut store = FakeStore::new();
        store.fail_writes = true;
        let mut index = EventIndex::new(Arc::new(store));

        let draft = EventDraft::new(EventPayload::Insulin { units: 4.0 });
        let err = index.create(draft).await.unwrap_err();
        assert!(matches!(err, RemoteWriteError::Unavailable));
        assert!(index.by_kind(Some("insulin")).is_empty());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_remove_deletes_remotely_then_locally() {
        let store = Arc::new(FakeStore::new());
        let mut index = EventIndex::new(store.clone());
        index.load(vec![
            event(1, "insulin", "2024-03-01T08:00:00"),
            event(2, "food", "2024-03-01T09:00:00"),
        ]);

        index.remove(1).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.all()[0].id, 2);
        assert_eq!(*store.deleted.lock().unwrap(), [1]);
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_local_state() {
        let mut store = FakeStore::new();
        store.fail_writes = true;
        let mut index = EventIndex::new(Arc::new(store));
        index.load(vec![event(1, "insulin", "2024-03-01T08:00:00")]);

        assert!(index.remove(1).await.is_err());
        assert_eq!(index.len(), 1);
    }
}
