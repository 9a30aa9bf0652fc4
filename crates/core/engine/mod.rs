//! The range engine: cached envelopes, viewport ranking and shared ranges.
//!
//! [`RangeEngine`] owns two caches in front of a [`RangeStore`]:
//! - **BBox cache**: species envelopes, filled from the bulk table once and
//!   then per species on demand
//! - **Geometry cache**: parsed range documents, fetched at most once each
//!
//! Cloning an engine shares both caches.

use crate::compute::geojson::{multi_polygon_to_geojson, parse_range_document};
use crate::compute::{RankedRange, bbox_of, combine, intersect_all};
use crate::config::Config;
use crate::storage::RangeStore;
use geojson::{GeoJson, Geometry};
use rangewatch_types::{BoundingBox, SpeciesKey};
use std::sync::Arc;

mod cache;

pub use cache::{BBoxCache, GeometryCache};

/// Cache occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct EngineStats {
    pub cached_boxes: usize,
    pub cached_documents: usize,
    pub preload_attempted: bool,
}

#[derive(Clone)]
pub struct RangeEngine {
    pub(crate) store: Arc<dyn RangeStore>,
    pub(crate) boxes: Arc<BBoxCache>,
    pub(crate) documents: Arc<GeometryCache>,
    pub(crate) config: Config,
}

impl RangeEngine {
    pub fn new(store: Arc<dyn RangeStore>) -> Self {
        Self::with_config(store, Config::default())
    }

    pub fn with_config(store: Arc<dyn RangeStore>, config: Config) -> Self {
        Self::with_caches(
            store,
            Arc::new(BBoxCache::new()),
            Arc::new(GeometryCache::new()),
            config,
        )
    }

    /// Builds an engine over caches owned by the caller.
    pub fn with_caches(
        store: Arc<dyn RangeStore>,
        boxes: Arc<BBoxCache>,
        documents: Arc<GeometryCache>,
        config: Config,
    ) -> Self {
        Self {
            store,
            boxes,
            documents,
            config,
        }
    }

    pub fn builder() -> crate::builder::EngineBuilder {
        crate::builder::EngineBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bbox_cache(&self) -> &Arc<BBoxCache> {
        &self.boxes
    }

    pub fn geometry_cache(&self) -> &Arc<GeometryCache> {
        &self.documents
    }

    /// Cached envelope only; never touches the store.
    pub fn cached_bbox(&self, key: &SpeciesKey) -> Option<BoundingBox> {
        self.boxes.get(key)
    }

    /// Envelope of a species range, loading it if needed.
    ///
    /// 1. A cached box is returned directly.
    /// 2. The first lookup on this engine fetches the bulk table once and
    ///    merges it into the cache.
    /// 3. Otherwise the range document is fetched and its envelope cached.
    ///
    /// Store failures are logged and yield `None`. A `None` result is not
    /// cached, so a later call retries the per-species fetch.
    pub fn get_or_load(&self, key: &SpeciesKey) -> Option<BoundingBox> {
        if let Some(bbox) = self.boxes.get(key) {
            return Some(bbox);
        }

        if self.boxes.claim_preload() {
            self.preload_table();
            if let Some(bbox) = self.boxes.get(key) {
                return Some(bbox);
            }
        }

        let document = self.load_range(key)?;
        let bbox = bbox_of(&document)?;
        log::debug!("Cached bbox for {}", key);
        Some(self.boxes.insert_if_absent(key.clone(), bbox))
    }

    fn preload_table(&self) {
        match self.store.load_bbox_table() {
            Ok(table) => {
                let total = table.len();
                let added = self.boxes.preload(table);
                log::debug!("Preloaded {} of {} bbox table entries", added, total);
            }
            Err(e) => log::warn!("Bulk bbox preload failed: {}", e),
        }
    }

    /// Parsed range document for a species, fetched at most once.
    pub fn load_range(&self, key: &SpeciesKey) -> Option<Arc<GeoJson>> {
        if let Some(document) = self.documents.get(key) {
            return Some(document);
        }

        let raw = match self.store.load_range(key) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to load range for {}: {}", key, e);
                return None;
            }
        };
        let Some(document) = parse_range_document(raw) else {
            log::warn!("Range document for {} is not GeoJSON", key);
            return None;
        };
        Some(self.documents.insert_if_absent(key.clone(), document))
    }

    /// Ranks candidates by overlap with `viewport`.
    ///
    /// Candidates may carry a known box. At most `missing_fetch_budget`
    /// uncached candidates are loaded, in input order; `None` uses the
    /// configured budget.
    pub fn rank_overlap<I>(
        &self,
        candidates: I,
        viewport: &BoundingBox,
        missing_fetch_budget: Option<usize>,
    ) -> Vec<RankedRange>
    where
        I: IntoIterator<Item = (SpeciesKey, Option<BoundingBox>)>,
    {
        let budget = missing_fetch_budget.unwrap_or(self.config.engine.missing_fetch_budget);
        crate::compute::rank_overlap(
            candidates,
            viewport,
            budget,
            |key| self.cached_bbox(key),
            |key| self.get_or_load(key),
        )
    }

    /// [`rank_overlap`](Self::rank_overlap) over bare species keys.
    pub fn rank_species<'a, I>(
        &self,
        keys: I,
        viewport: &BoundingBox,
        missing_fetch_budget: Option<usize>,
    ) -> Vec<RankedRange>
    where
        I: IntoIterator<Item = &'a SpeciesKey>,
    {
        self.rank_overlap(
            keys.into_iter().map(|key| (key.clone(), None)),
            viewport,
            missing_fetch_budget,
        )
    }

    /// The area every listed species' range covers, as MultiPolygon GeoJSON.
    ///
    /// Returns `None` for fewer than two keys, for a missing or malformed
    /// range, and when the ranges share no area.
    pub fn common_range(&self, keys: &[SpeciesKey]) -> Option<Geometry> {
        if keys.len() < 2 {
            return None;
        }

        let mut ranges = Vec::with_capacity(keys.len());
        for key in keys {
            let document = self.load_range(key)?;
            match combine(&document) {
                Ok(multi) => ranges.push(multi),
                Err(e) => {
                    log::trace!("Skipping shared range: {} has {}", key, e);
                    return None;
                }
            }
        }

        intersect_all(&ranges).map(|shared| multi_polygon_to_geojson(&shared))
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cached_boxes: self.boxes.len(),
            cached_documents: self.documents.len(),
            preload_attempted: self.boxes.preload_attempted(),
        }
    }
}

impl std::fmt::Debug for RangeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeEngine")
            .field("stats", &self.stats())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRangeStore;
    use serde_json::json;
    use std::collections::HashMap;

    fn key(name: &str) -> SpeciesKey {
        SpeciesKey::from_normalized(name)
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> serde_json::Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
        })
    }

    #[test]
    fn test_get_or_load_prefers_table_then_document() {
        let table = HashMap::from([(key("a"), BoundingBox::new(0.0, 0.0, 1.0, 1.0))]);
        let store = Arc::new(
            MemoryRangeStore::new()
                .with_bbox_table(table)
                .with_range(key("b"), square(2.0, 2.0, 4.0, 5.0)),
        );
        let engine = RangeEngine::new(store.clone());

        assert_eq!(engine.get_or_load(&key("a")), Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(engine.get_or_load(&key("b")), Some(BoundingBox::new(2.0, 2.0, 4.0, 5.0)));
        assert_eq!(engine.get_or_load(&key("b")), Some(BoundingBox::new(2.0, 2.0, 4.0, 5.0)));

        let stats = store.stats();
        assert_eq!(stats.table_fetches, 1);
        assert_eq!(stats.range_fetches, 1);
    }

    #[test]
    fn test_missing_range_is_not_cached() {
        let store = Arc::new(MemoryRangeStore::new());
        let engine = RangeEngine::new(store.clone());

        assert_eq!(engine.get_or_load(&key("missing")), None);
        assert_eq!(engine.get_or_load(&key("missing")), None);
        assert_eq!(engine.cached_bbox(&key("missing")), None);
        assert_eq!(store.stats().range_fetches, 2);
        assert_eq!(store.stats().table_fetches, 1);
    }

    #[test]
    fn test_clones_share_caches() {
        let store = Arc::new(MemoryRangeStore::new().with_range(key("a"), square(0.0, 0.0, 1.0, 1.0)));
        let engine = RangeEngine::new(store);
        let clone = engine.clone();

        assert!(engine.get_or_load(&key("a")).is_some());
        assert!(clone.cached_bbox(&key("a")).is_some());
        assert_eq!(clone.stats().cached_documents, 1);
        assert!(clone.stats().preload_attempted);
    }

    #[test]
    fn test_common_range_overlap() {
        let store = Arc::new(
            MemoryRangeStore::new()
                .with_range(key("a"), square(0.0, 0.0, 10.0, 10.0))
                .with_range(key("b"), square(5.0, 5.0, 15.0, 15.0)),
        );
        let engine = RangeEngine::new(store);

        let shared = engine.common_range(&[key("a"), key("b")]).unwrap();
        let bbox = bbox_of(&GeoJson::Geometry(shared)).unwrap();
        assert_eq!(bbox.to_array(), [5.0, 5.0, 10.0, 10.0]);

        assert!(engine.common_range(&[key("a")]).is_none());
        assert!(engine.common_range(&[key("a"), key("missing")]).is_none());
    }
}
