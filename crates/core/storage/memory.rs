//! In-memory range store.

use super::{RangeStore, StoreStats};
use crate::error::{RangeError, Result};
use parking_lot::Mutex;
use rangewatch_types::{BoundingBox, SpeciesKey};
use rustc_hash::FxHashMap;
use std::collections::HashMap;

/// Range store backed by maps, counting every fetch.
///
/// With no bbox table set, `load_bbox_table` fails, which exercises the
/// per-species fallback path.
#[derive(Default)]
pub struct MemoryRangeStore {
    ranges: FxHashMap<SpeciesKey, serde_json::Value>,
    bbox_table: Option<HashMap<SpeciesKey, BoundingBox>>,
    stats: Mutex<StoreStats>,
}

impl MemoryRangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, key: SpeciesKey, document: serde_json::Value) -> Self {
        self.insert_range(key, document);
        self
    }

    pub fn with_bbox_table(mut self, table: HashMap<SpeciesKey, BoundingBox>) -> Self {
        self.bbox_table = Some(table);
        self
    }

    pub fn insert_range(&mut self, key: SpeciesKey, document: serde_json::Value) {
        self.ranges.insert(key, document);
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        *self.stats.lock()
    }
}

impl RangeStore for MemoryRangeStore {
    fn load_range(&self, key: &SpeciesKey) -> Result<serde_json::Value> {
        self.stats.lock().range_fetches += 1;
        self.ranges
            .get(key)
            .cloned()
            .ok_or_else(|| RangeError::RangeNotFound(key.clone()))
    }

    fn load_bbox_table(&self) -> Result<HashMap<SpeciesKey, BoundingBox>> {
        self.stats.lock().table_fetches += 1;
        self.bbox_table
            .clone()
            .ok_or_else(|| RangeError::InvalidInput("no bbox table available".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetches_are_counted() {
        let key = SpeciesKey::from_normalized("Crotalus_atrox");
        let store = MemoryRangeStore::new().with_range(key.clone(), json!({ "type": "Polygon" }));

        assert!(store.load_range(&key).is_ok());
        assert!(matches!(
            store.load_range(&SpeciesKey::from_normalized("Missing")),
            Err(RangeError::RangeNotFound(_))
        ));
        assert!(store.load_bbox_table().is_err());

        let stats = store.stats();
        assert_eq!(stats.range_fetches, 2);
        assert_eq!(stats.table_fetches, 1);
    }

    #[test]
    fn test_bbox_table() {
        let key = SpeciesKey::from_normalized("Crotalus_atrox");
        let table = HashMap::from([(key.clone(), BoundingBox::new(0.0, 0.0, 1.0, 1.0))]);
        let store = MemoryRangeStore::new().with_bbox_table(table);
        assert_eq!(store.load_bbox_table().unwrap().len(), 1);
        assert!(store.is_empty());
    }
}
