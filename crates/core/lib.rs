//! Occurrence ingestion, range bounding-box caching and shared-range intersection.
//!
//! ## Features
//! - **Ingestion**: raw occurrence rows are filtered by region, recency and
//!   quality, deduplicated and partitioned per species
//! - **Range engine**: cached envelopes of range polygons, viewport overlap
//!   ranking under a fetch budget
//! - **Shared ranges**: the polygon area common to any set of species
//! - **Metrics scan**: per-species data-quality counters over raw rows
//!
//! ```rust
//! use rangewatch::{EngineBuilder, MemoryRangeStore, SpeciesKey, BoundingBox};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let atrox = SpeciesKey::normalize("Crotalus atrox").unwrap();
//! let store = MemoryRangeStore::new().with_range(
//!     atrox.clone(),
//!     json!({ "type": "Polygon",
//!             "coordinates": [[[-117, 22], [-93, 22], [-93, 38], [-117, 38], [-117, 22]]] }),
//! );
//! let engine = EngineBuilder::new().store(Arc::new(store)).build()?;
//!
//! let viewport = BoundingBox::new(-125.0, 24.0, -66.0, 49.0);
//! let ranked = engine.rank_species([&atrox], &viewport, None);
//! assert_eq!(ranked[0].species_key, atrox);
//! # Ok::<(), rangewatch::RangeError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod storage;

pub use builder::EngineBuilder;
pub use engine::{BBoxCache, EngineStats, GeometryCache, RangeEngine};
pub use error::{RangeError, Result};

pub use compute::{RankedRange, bbox_of, bbox_table, combine, intersect_all};
pub use config::{Config, EngineConfig, IngestConfig, MetricsConfig};
pub use ingest::{IngestOutput, Ingestor, MetricsReport, RawRow, ingest, scan_metrics};
pub use storage::{DirectoryRangeStore, MemoryRangeStore, PartitionWriter, RangeStore};

pub use rangewatch_types::{
    BoundingBox, DropCounters, Sighting, SourceKind, SpeciesIndexEntry, SpeciesKey,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{EngineBuilder, RangeEngine, RangeError, Result};

    pub use crate::{BoundingBox, Sighting, SpeciesKey};

    pub use crate::{Config, Ingestor, RawRow};

    pub use crate::{DirectoryRangeStore, MemoryRangeStore, RangeStore};
}
