//! Engine builder
//!
//! Assembles a [`RangeEngine`] from a store, a configuration and optionally
//! caches shared with other engines.

use crate::config::Config;
use crate::engine::{BBoxCache, GeometryCache, RangeEngine};
use crate::error::{RangeError, Result};
use crate::storage::{DirectoryRangeStore, RangeStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for [`RangeEngine`].
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn RangeStore>>,
    config: Config,
    boxes: Option<Arc<BBoxCache>>,
    documents: Option<Arc<GeometryCache>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn RangeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a [`DirectoryRangeStore`] rooted at `path`.
    pub fn directory<P: Into<PathBuf>>(self, path: P) -> Self {
        self.store(Arc::new(DirectoryRangeStore::new(path)))
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn bbox_cache(mut self, cache: Arc<BBoxCache>) -> Self {
        self.boxes = Some(cache);
        self
    }

    pub fn geometry_cache(mut self, cache: Arc<GeometryCache>) -> Self {
        self.documents = Some(cache);
        self
    }

    /// Validates the configuration and builds the engine.
    pub fn build(self) -> Result<RangeEngine> {
        self.config.check()?;
        let store = self
            .store
            .ok_or_else(|| RangeError::Config("a range store is required".to_string()))?;

        Ok(RangeEngine::with_caches(
            store,
            self.boxes.unwrap_or_default(),
            self.documents.unwrap_or_default(),
            self.config,
        ))
    }
}
