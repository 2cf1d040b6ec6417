//! In-memory stores over fetched data
//!
//! - [`TimeSeriesStore`]: glucose readings with windowed views
//! - [`EventIndex`]: the single owned event list, with filter/sort views and
//!   CRUD against the remote store
//!
//! Reads are pure and return owned projections; consumers never hold a copy
//! that can drift from the index.

mod events;
mod readings;

pub use events::{EventIndex, ALL_KINDS};
pub use readings::{TimeSeriesStore, WINDOW_HOURS};
