//! Range selection state machine
//!
//! Tracks which catalog category, time range, and event subset the user has
//! selected, and keeps the derived display list in sync. Selection indices
//! refer to positions in the displayed list, not event ids, and are reset
//! whenever the context that produced them changes.

use std::collections::BTreeSet;

use futures_util::future::join_all;

use crate::client::{RemoteStore, RemoteWriteError};
use crate::model::{Event, EventCatalog, TimeSpan};

/// Visible progress label for the consequence upload button
///
/// Transitions `Remember -> Remembering -> Done` regardless of individual
/// request outcomes; the returned [`CommitOutcome`] is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitLabel {
    Remember,
    Remembering,
    Done,
}

impl std::fmt::Display for CommitLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitLabel::Remember => write!(f, "Remember"),
            CommitLabel::Remembering => write!(f, "Remembering…"),
            CommitLabel::Done => write!(f, "Done"),
        }
    }
}

/// Aggregate result of a consequence upload batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    AllSucceeded,
    Partial,
    AllFailed,
}

/// Per-event outcomes of a consequence upload batch
///
/// Requests are independent and unordered; there is no atomicity and no
/// rollback across the batch.
#[derive(Debug)]
pub struct CommitOutcome {
    pub results: Vec<(Event, Result<(), RemoteWriteError>)>,
}

impl CommitOutcome {
    pub fn status(&self) -> CommitStatus {
        let failed = self.results.iter().filter(|(_, r)| r.is_err()).count();
        if failed == 0 {
            CommitStatus::AllSucceeded
        } else if failed == self.results.len() {
            CommitStatus::AllFailed
        } else {
            CommitStatus::Partial
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Selection state over an [`EventCatalog`]
pub struct RangeSelector {
    catalog: EventCatalog,
    active_category: Option<String>,
    active_range: Option<usize>,
    selected: BTreeSet<usize>,
    displayed: Vec<Event>,
    label: CommitLabel,
}

impl RangeSelector {
    /// Create a selector with the first catalog category pre-selected
    pub fn new(catalog: EventCatalog) -> Self {
        let active_category = catalog.first_key().map(str::to_string);
        Self {
            catalog,
            active_category,
            active_range: None,
            selected: BTreeSet::new(),
            displayed: Vec::new(),
            label: CommitLabel::Remember,
        }
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    pub fn active_range(&self) -> Option<usize> {
        self.active_range
    }

    /// Events currently shown in the table
    pub fn displayed(&self) -> &[Event] {
        &self.displayed
    }

    /// Indices into [`Self::displayed`] currently checked
    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn is_selected(&self, display_index: usize) -> bool {
        self.selected.contains(&display_index)
    }

    pub fn label(&self) -> CommitLabel {
        self.label
    }

    /// Spans of the active category's ranges, for chart overlays
    pub fn spans(&self) -> Vec<TimeSpan> {
        self.active_category
            .as_deref()
            .and_then(|key| self.catalog.ranges(key))
            .map(|ranges| ranges.iter().map(|r| r.span).collect())
            .unwrap_or_default()
    }

    /// Switch the active category
    ///
    /// Clears the range, the checkbox selection, and the displayed list.
    /// Unknown keys are ignored.
    pub fn select_category(&mut self, key: &str) -> bool {
        if !self.catalog.contains_key(key) {
            return false;
        }
        self.active_category = Some(key.to_string());
        self.active_range = None;
        self.selected.clear();
        self.displayed.clear();
        self.label = CommitLabel::Remember;
        true
    }

    /// Select a range within the active category
    ///
    /// Re-selecting the active range toggles it off and empties the
    /// displayed list; otherwise the range's events replace the displayed
    /// list. Either way the checkbox selection is cleared.
    pub fn select_range(&mut self, index: usize) -> bool {
        let Some(key) = self.active_category.as_deref() else {
            return false;
        };
        let Some(ranges) = self.catalog.ranges(key) else {
            return false;
        };
        if index >= ranges.len() {
            return false;
        }

        self.label = CommitLabel::Remember;
        self.selected.clear();
        if self.active_range == Some(index) {
            self.active_range = None;
            self.displayed.clear();
        } else {
            self.active_range = Some(index);
            self.displayed = ranges[index].events.clone();
        }
        true
    }

    /// Flip the checkbox on a displayed event
    ///
    /// No-op when no range is active or the index is out of bounds.
    pub fn toggle_event(&mut self, display_index: usize) -> bool {
        if self.active_range.is_none() || display_index >= self.displayed.len() {
            return false;
        }
        self.label = CommitLabel::Remember;
        if !self.selected.remove(&display_index) {
            self.selected.insert(display_index);
        }
        true
    }

    /// Hide an event from the active category's grouping
    ///
    /// View-only: the event stays in the underlying event store. When the
    /// dismissed event belongs to the displayed range, the displayed list is
    /// rebuilt and the checkbox selection cleared (indices shift).
    pub fn dismiss_event(&mut self, range_index: usize, event_id: i64) -> bool {
        let Some(key) = self.active_category.clone() else {
            return false;
        };
        let Some(ranges) = self.catalog.ranges_mut(&key) else {
            return false;
        };
        let Some(range) = ranges.get_mut(range_index) else {
            return false;
        };
        let before = range.events.len();
        range.events.retain(|e| e.id != event_id);
        if range.events.len() == before {
            return false;
        }

        if self.active_range == Some(range_index) {
            self.displayed = range.events.clone();
            self.selected.clear();
        }
        true
    }

    /// Upload a consequence annotation for every checked event
    ///
    /// Requires a non-empty selection. Requests are dispatched together and
    /// complete independently in any order; failures do not roll back the
    /// rest of the batch. Returns `None` when nothing is selected.
    pub async fn commit(
        &mut self,
        store: &dyn RemoteStore,
        consequence: &str,
    ) -> Option<CommitOutcome> {
        if self.selected.is_empty() {
            return None;
        }

        self.label = CommitLabel::Remembering;
        let targets: Vec<Event> = self
            .selected
            .iter()
            .filter_map(|&i| self.displayed.get(i).cloned())
            .collect();

        let results = join_all(
            targets
                .iter()
                .map(|event| store.record_consequence(event, consequence)),
        )
        .await;

        self.label = CommitLabel::Done;
        Some(CommitOutcome {
            results: targets.into_iter().zip(results).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeStore;
    use crate::model::{parse_timestamp, EventPayload, EventRange};

    fn event(id: i64, ts: &str) -> Event {
        Event {
            id,
            timestamp: parse_timestamp(ts).unwrap(),
            description: Some(format!("event {}", id)),
            payload: EventPayload::Insulin { units: 1.0 },
        }
    }

    fn span(from: &str, to: &str) -> TimeSpan {
        TimeSpan::new(parse_timestamp(from).unwrap(), parse_timestamp(to).unwrap())
    }

    fn catalog() -> EventCatalog {
        let mut catalog = EventCatalog::new();
        catalog.insert(
            "hyperglycemic",
            vec![
                EventRange {
                    span: span("2024-03-01T09:00:00", "2024-03-01T10:00:00"),
                    events: vec![event(1, "2024-03-01T08:40:00"), event(2, "2024-03-01T08:50:00")],
                },
                EventRange {
                    span: span("2024-03-01T14:00:00", "2024-03-01T15:00:00"),
                    events: vec![event(3, "2024-03-01T13:45:00")],
                },
            ],
        );
        catalog.insert(
            "hypoglycemic",
            vec![EventRange {
                span: span("2024-03-01T17:00:00", "2024-03-01T17:30:00"),
                events: vec![event(4, "2024-03-01T16:20:00")],
            }],
        );
        catalog
    }

    #[test]
    fn test_initial_state_uses_first_category() {
        let selector = RangeSelector::new(catalog());
        assert_eq!(selector.active_category(), Some("hyperglycemic"));
        assert_eq!(selector.active_range(), None);
        assert!(selector.selected().is_empty());
        assert!(selector.displayed().is_empty());
        assert_eq!(selector.label(), CommitLabel::Remember);

        let empty = RangeSelector::new(EventCatalog::new());
        assert_eq!(empty.active_category(), None);
    }

    #[test]
    fn test_select_category_resets_selection() {
        let mut selector = RangeSelector::new(catalog());
        selector.select_range(0);
        selector.toggle_event(0);
        assert!(!selector.selected().is_empty());

        assert!(selector.select_category("hypoglycemic"));
        assert_eq!(selector.active_category(), Some("hypoglycemic"));
        assert_eq!(selector.active_range(), None);
        assert!(selector.selected().is_empty());
        assert!(selector.displayed().is_empty());
    }

    #[test]
    fn test_select_unknown_category_is_noop() {
        let mut selector = RangeSelector::new(catalog());
        assert!(!selector.select_category("nonsense"));
        assert_eq!(selector.active_category(), Some("hyperglycemic"));
    }

    #[test]
    fn test_select_range_shows_its_events() {
        let mut selector = RangeSelector::new(catalog());
        assert!(selector.select_range(0));
        assert_eq!(selector.active_range(), Some(0));
        assert_eq!(
            selector.displayed().iter().map(|e| e.id).collect::<Vec<_>>(),
            [1, 2]
        );
    }

    #[test]
    fn test_reselect_same_range_toggles_off() {
        let mut selector = RangeSelector::new(catalog());
        selector.select_range(1);
        selector.toggle_event(0);

        assert!(selector.select_range(1));
        assert_eq!(selector.active_range(), None);
        assert!(selector.displayed().is_empty());
        assert!(selector.selected().is_empty());
    }

    #[test]
    fn test_switching_ranges_clears_selection() {
        let mut selector = RangeSelector::new(catalog());
        selector.select_range(0);
        selector.toggle_event(1);

        selector.select_range(1);
        assert_eq!(selector.active_range(), Some(1));
        assert!(selector.selected().is_empty());
        assert_eq!(selector.displayed().len(), 1);
    }

    #[test]
    fn test_select_range_out_of_bounds_is_noop() {
        let mut selector = RangeSelector::new(catalog());
        assert!(!selector.select_range(5));
        assert_eq!(selector.active_range(), None);
    }

    #[test]
    fn test_toggle_event_requires_active_range() {
        let mut selector = RangeSelector::new(catalog());
        assert!(!selector.toggle_event(0));
        assert!(selector.selected().is_empty());

        selector.select_range(0);
        assert!(selector.toggle_event(0));
        assert!(selector.is_selected(0));
        assert!(selector.toggle_event(0));
        assert!(!selector.is_selected(0));

        assert!(!selector.toggle_event(10));
    }

    #[test]
    fn test_spans_follow_active_category() {
        let mut selector = RangeSelector::new(catalog());
        assert_eq!(selector.spans().len(), 2);
        selector.select_category("hypoglycemic");
        assert_eq!(selector.spans().len(), 1);
    }

    #[test]
    fn test_dismiss_event_is_view_only_and_refreshes_display() {
        let mut selector = RangeSelector::new(catalog());
        selector.select_range(0);
        selector.toggle_event(1);

        assert!(selector.dismiss_event(0, 1));
        assert_eq!(
            selector.displayed().iter().map(|e| e.id).collect::<Vec<_>>(),
            [2]
        );
        assert!(selector.selected().is_empty());

        // Dismissing an absent id reports false.
        assert!(!selector.dismiss_event(0, 99));
    }

    #[tokio::test]
    async fn test_commit_requires_selection() {
        let store = FakeStore::new();
        let mut selector = RangeSelector::new(catalog());
        selector.select_range(0);
        assert!(selector.commit(&store, "hyperglycemia").await.is_none());
        assert_eq!(selector.label(), CommitLabel::Remember);
    }

    #[tokio::test]
    async fn test_commit_uploads_each_selected_event() {
        let store = FakeStore::new();
        let mut selector = RangeSelector::new(catalog());
        selector.select_range(0);
        selector.toggle_event(0);
        selector.toggle_event(1);

        let outcome = selector.commit(&store, "hyperglycemia").await.unwrap();
        assert_eq!(outcome.status(), CommitStatus::AllSucceeded);
        assert_eq!(selector.label(), CommitLabel::Done);

        let uploads = store.consequences.lock().unwrap();
        assert_eq!(uploads.len(), 2);
        assert!(uploads.iter().all(|(_, tag)| tag == "hyperglycemia"));
    }

    #[tokio::test]
    async fn test_commit_partial_failure_completes_the_rest() {
        let mut store = FakeStore::new();
        // Three selected events; the middle one fails.
        store.fail_consequence_for.insert(2);

        let mut catalog = EventCatalog::new();
        catalog.insert(
            "hyperglycemic",
            vec![EventRange {
                span: span("2024-03-01T09:00:00", "2024-03-01T10:00:00"),
                events: vec![
                    event(1, "2024-03-01T08:40:00"),
                    event(2, "2024-03-01T08:45:00"),
                    event(3, "2024-03-01T08:50:00"),
                ],
            }],
        );

        let mut selector = RangeSelector::new(catalog);
        selector.select_range(0);
        for i in 0..3 {
            selector.toggle_event(i);
        }

        let outcome = selector.commit(&store, "spike").await.unwrap();
        assert_eq!(outcome.status(), CommitStatus::Partial);
        assert_eq!(outcome.succeeded(), 2);
        assert_eq!(outcome.failed(), 1);

        let delivered: Vec<i64> = store
            .consequences
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(delivered, [1, 3]);

        // The label conflates outcomes; the outcome itself does not.
        assert_eq!(selector.label(), CommitLabel::Done);
    }

    #[tokio::test]
    async fn test_commit_all_failed() {
        let mut store = FakeStore::new();
        store.fail_writes = true;
        let mut selector = RangeSelector::new(catalog());
        selector.select_range(0);
        selector.toggle_event(0);

        let outcome = selector.commit(&store, "spike").await.unwrap();
        assert_eq!(outcome.status(), CommitStatus::AllFailed);
    }
}
