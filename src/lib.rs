//! # GlucoLens
//!
//! Glucose Intelligence Client - the client-side core of a glucose
//! self-tracking dashboard: fetch readings and logged events from a backend
//! API, window and filter them in memory, correlate readings against labeled
//! "interesting" time ranges, and keep a UI selection state consistent with
//! that mapping.
//!
//! ## Features
//!
//! - **Windowed readings**: rolling-cutoff views over the glucose feed
//! - **Event index**: one owned event list with pure filter/sort views and
//!   remote CRUD
//! - **Range selection**: a small state machine over category, range, and
//!   event selection, with per-item tracked consequence uploads
//! - **Episode detection**: client-side hyperglycemic / hypoglycemic /
//!   rate-of-change classification with event attribution
//! - **Remote classifiers**: photo-based nutrition analysis and consequence
//!   recommendations behind the same client seam
//!
//! ## Modules
//!
//! - [`model`]: readings, events, payloads, and the interval catalog
//! - [`store`]: in-memory stores over fetched data
//! - [`select`]: the range/event selection state machine
//! - [`detect`]: interesting-range detection
//! - [`client`]: REST client and the `RemoteStore` seam
//! - [`session`]: composition root for one dashboard session
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use glucolens::{ApiClient, ApiConfig, Session};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(ApiClient::new(ApiConfig::default()));
//!     let session = Session::start(client).await;
//!
//!     // Last 3 hours of readings, newest events first
//!     let recent = session.windowed(3.0);
//!     let events = session.events().sorted_by_recency();
//!
//!     println!("{} readings, {} events", recent.len(), events.len());
//! }
//! ```

pub mod client;
pub mod config;
pub mod detect;
pub mod model;
pub mod select;
pub mod session;
pub mod store;

// Re-export top-level types for convenience
pub use model::{
    Event, EventCatalog, EventDraft, EventPayload, EventRange, GlucoseReading, NutritionFacts,
    TimeSpan,
};

pub use store::{EventIndex, TimeSeriesStore, ALL_KINDS, WINDOW_HOURS};

pub use select::{CommitLabel, CommitOutcome, CommitStatus, RangeSelector};

pub use detect::{detect_catalog, DetectionConfig};

pub use client::{
    ApiClient, ApiConfig, FetchError, Recommendation, RecommendationQuery, RemoteStore,
    RemoteWriteError,
};

pub use session::{Session, StatusKind, StatusMessage};

pub use config::{
    generate_default_config, ApiConfig as ConfigApiConfig, Config, ConfigError, LoggingConfig,
};
