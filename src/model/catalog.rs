//! Interesting-event catalog
//!
//! The classification source groups events under category keys (e.g.
//! `"hyperglycemic"`), each key holding a sequence of labeled time ranges
//! with the events attributed to them. Key order follows the source document
//! — the first key seeds the initial selection — so the catalog preserves
//! insertion order rather than using a hash map.

use serde::{Deserialize, Deserializer, Serialize};

use super::event::Event;
use super::time::TimeSpan;

/// A labeled time interval bundling attributed events
///
/// Events inside a range are advisory grouping only; containment within the
/// span is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRange {
    #[serde(rename = "range")]
    pub span: TimeSpan,
    pub events: Vec<Event>,
}

/// Ordered mapping from category key to its event ranges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    categories: Vec<(String, Vec<EventRange>)>,
}

impl EventCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category, replacing an existing one with the same key
    pub fn insert(&mut self, key: impl Into<String>, ranges: Vec<EventRange>) {
        let key = key.into();
        if let Some(entry) = self.categories.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = ranges;
        } else {
            self.categories.push((key, ranges));
        }
    }

    /// Category keys in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(k, _)| k.as_str())
    }

    /// First category key, if any
    pub fn first_key(&self) -> Option<&str> {
        self.categories.first().map(|(k, _)| k.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.categories.iter().any(|(k, _)| k == key)
    }

    /// Ranges for a category
    pub fn ranges(&self, key: &str) -> Option<&[EventRange]> {
        self.categories
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, ranges)| ranges.as_slice())
    }

    pub(crate) fn ranges_mut(&mut self, key: &str) -> Option<&mut Vec<EventRange>> {
        self.categories
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, ranges)| ranges)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

// On the wire the catalog is a plain JSON object.
impl Serialize for EventCatalog {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = ser.serialize_map(Some(self.categories.len()))?;
        for (key, ranges) in &self.categories {
            map.serialize_entry(key, ranges)?;
        }
        map.end()
    }
}

// Deserialized through a map visitor so key order survives; a derived
// HashMap would scramble the first-key semantics.
impl<'de> Deserialize<'de> for EventCatalog {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> serde::de::Visitor<'de> for CatalogVisitor {
            type Value = EventCatalog;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of category keys to event ranges")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> Result<Self::Value, A::Error> {
                let mut catalog = EventCatalog::new();
                while let Some((key, ranges)) = map.next_entry::<String, Vec<EventRange>>()? {
                    catalog.insert(key, ranges);
                }
                Ok(catalog)
            }
        }

        de.deserialize_map(CatalogVisitor)
    }
}
