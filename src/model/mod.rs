//! Core data types for the GlucoLens client
//!
//! This module defines the fundamental types shared across the crate:
//! - `GlucoseReading`: a single glucose measurement
//! - `Event`: a logged occurrence (insulin, food, exercise, free-form)
//! - `EventPayload` and `NutritionFacts`: typed event payloads
//! - `TimeSpan`, `EventRange`, `EventCatalog`: labeled interval groupings

mod catalog;
mod event;
mod nutrition;
mod reading;
pub(crate) mod time;

pub use catalog::{EventCatalog, EventRange};
pub use event::{Event, EventDraft, EventPayload};
pub use nutrition::NutritionFacts;
pub use reading::GlucoseReading;
pub use time::{parse_timestamp, split_date_time, TimeSpan};
