//! Engine caches: species envelopes and parsed range documents.
//!
//! Both caches only grow. Inserts never overwrite an existing entry, so a
//! value observed once stays stable for the life of the engine.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use geojson::GeoJson;
use rangewatch_types::{BoundingBox, SpeciesKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Species key → envelope, plus the "bulk preload attempted" flag
#[derive(Debug, Default)]
pub struct BBoxCache {
    boxes: DashMap<SpeciesKey, BoundingBox>,
    preload_attempted: AtomicBool,
}

impl BBoxCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SpeciesKey) -> Option<BoundingBox> {
        self.boxes.get(key).map(|entry| *entry)
    }

    /// Inserts unless present; returns the cached value either way.
    pub fn insert_if_absent(&self, key: SpeciesKey, bbox: BoundingBox) -> BoundingBox {
        *self.boxes.entry(key).or_insert(bbox)
    }

    /// Merges a bulk table without replacing existing entries.
    ///
    /// Returns how many entries were new.
    pub fn preload<I>(&self, table: I) -> usize
    where
        I: IntoIterator<Item = (SpeciesKey, BoundingBox)>,
    {
        let mut added = 0;
        for (key, bbox) in table {
            if let Entry::Vacant(slot) = self.boxes.entry(key) {
                slot.insert(bbox);
                added += 1;
            }
        }
        added
    }

    /// Claims the one bulk preload. Only the first caller gets `true`.
    pub fn claim_preload(&self) -> bool {
        self.preload_attempted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn preload_attempted(&self) -> bool {
        self.preload_attempted.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Species key → parsed range document
#[derive(Debug, Default)]
pub struct GeometryCache {
    documents: DashMap<SpeciesKey, Arc<GeoJson>>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SpeciesKey) -> Option<Arc<GeoJson>> {
        self.documents.get(key).map(|entry| Arc::clone(&entry))
    }

    /// Inserts unless present; returns the cached document either way.
    pub fn insert_if_absent(&self, key: SpeciesKey, document: GeoJson) -> Arc<GeoJson> {
        Arc::clone(&self.documents.entry(key).or_insert_with(|| Arc::new(document)))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> SpeciesKey {
        SpeciesKey::from_normalized(name)
    }

    #[test]
    fn test_insert_never_overwrites() {
        let cache = BBoxCache::new();
        let first = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let second = BoundingBox::new(5.0, 5.0, 6.0, 6.0);

        assert_eq!(cache.insert_if_absent(key("a"), first), first);
        assert_eq!(cache.insert_if_absent(key("a"), second), first);
        assert_eq!(cache.get(&key("a")), Some(first));
    }

    #[test]
    fn test_preload_keeps_existing_entries() {
        let cache = BBoxCache::new();
        let existing = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        cache.insert_if_absent(key("a"), existing);

        let added = cache.preload([
            (key("a"), BoundingBox::new(9.0, 9.0, 10.0, 10.0)),
            (key("b"), BoundingBox::new(2.0, 2.0, 3.0, 3.0)),
        ]);
        assert_eq!(added, 1);
        assert_eq!(cache.get(&key("a")), Some(existing));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_preload_claimed_once() {
        let cache = BBoxCache::new();
        assert!(!cache.preload_attempted());
        assert!(cache.claim_preload());
        assert!(!cache.claim_preload());
        assert!(cache.preload_attempted());
    }

    #[test]
    fn test_geometry_cache_shares_documents() {
        let cache = GeometryCache::new();
        let doc: GeoJson = r#"{"type":"Point","coordinates":[0,0]}"#.parse().unwrap();
        let a = cache.insert_if_absent(key("a"), doc.clone());
        let b = cache.insert_if_absent(key("a"), doc);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &cache.get(&key("a")).unwrap()));
    }
}
