//! Geometry algorithms: envelopes, overlap ranking, shared-range intersection,
//! validation and GeoJSON conversion.

pub mod bbox;
pub mod geojson;
pub mod intersection;
pub mod overlap;
pub mod validation;

pub use bbox::{bbox_of, bbox_table};
pub use intersection::{combine, intersect_all};
pub use overlap::{RankedRange, rank_overlap};
