//! # rangewatch-types
//!
//! Core data types shared by the rangewatch crates:
//!
//! - **Bounding boxes**: `BoundingBox`, a normalised lon/lat envelope
//! - **Species**: `SpeciesKey`, the normalised scientific-name key
//! - **Sightings**: `Sighting`, `SourceKind`, `SpeciesIndexEntry`
//! - **Counters**: `DropCounters` for ingestion runs
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ```rust
//! use rangewatch_types::bbox::BoundingBox;
//! use rangewatch_types::species::SpeciesKey;
//!
//! let key = SpeciesKey::normalize("Crotalus atrox").unwrap();
//! let range = BoundingBox::new(-117.0, 22.0, -93.0, 38.0);
//! let viewport = BoundingBox::new(-125.0, 24.0, -66.0, 49.0);
//! assert!(range.intersects(&viewport));
//! assert_eq!(key.as_str(), "Crotalus_atrox");
//! ```

pub mod bbox;
pub mod sighting;
pub mod species;
pub mod stats;

pub use bbox::BoundingBox;
pub use sighting::{Sighting, SourceKind, SpeciesIndexEntry};
pub use species::SpeciesKey;
pub use stats::DropCounters;
