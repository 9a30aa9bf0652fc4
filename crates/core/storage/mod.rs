//! Range document stores and the ingestion output writer.
//!
//! A [`RangeStore`] supplies raw range documents and the precomputed bbox
//! table to the engine. Implementations are blocking; the engine never holds a
//! cache lock across a store call.

use crate::error::Result;
use rangewatch_types::{BoundingBox, SpeciesKey};
use std::collections::HashMap;

mod directory;
mod memory;
mod writer;

pub use directory::DirectoryRangeStore;
pub use memory::MemoryRangeStore;
pub use writer::{BBOX_TABLE_FILE, INDEX_FILE, PartitionWriter};

/// Source of range documents for the engine.
pub trait RangeStore: Send + Sync {
    /// Fetch the raw GeoJSON range document for one species.
    ///
    /// A species with no document fails with [`crate::RangeError::RangeNotFound`].
    fn load_range(&self, key: &SpeciesKey) -> Result<serde_json::Value>;

    /// Fetch the precomputed bbox table in bulk.
    fn load_bbox_table(&self) -> Result<HashMap<SpeciesKey, BoundingBox>>;
}

/// Fetch counters kept by stores that track them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub range_fetches: u64,
    pub table_fetches: u64,
}
