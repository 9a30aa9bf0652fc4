//! Shared-range intersection over any number of range polygons.

use crate::compute::geojson::feature_parts;
use crate::error::{RangeError, Result};
use geo::{Area, BooleanOps, MultiPolygon};
use geojson::GeoJson;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Merges a document's features into one multipolygon by polygon union.
///
/// Fails with [`RangeError::InvalidGeometry`] on malformed rings or when the
/// union itself cannot be computed.
pub fn combine(document: &GeoJson) -> Result<MultiPolygon> {
    let mut parts = feature_parts(document)?.into_iter();
    let Some(first) = parts.next() else {
        return Ok(MultiPolygon::new(Vec::new()));
    };

    parts.try_fold(first, |acc, part| {
        guarded(|| acc.union(&part))
            .ok_or_else(|| RangeError::InvalidGeometry("polygon union failed".to_string()))
    })
}

/// Intersects all ranges left to right, in the order given.
///
/// Returns `None` for fewer than two ranges, as soon as the running result has
/// no area, or when a boolean operation fails.
pub fn intersect_all(ranges: &[MultiPolygon]) -> Option<MultiPolygon> {
    let (first, rest) = ranges.split_first()?;
    if rest.is_empty() || is_empty(first) {
        return None;
    }

    let mut running = first.clone();
    for next in rest {
        running = guarded(|| running.intersection(next))?;
        if is_empty(&running) {
            return None;
        }
    }
    Some(running)
}

fn is_empty(multi: &MultiPolygon) -> bool {
    multi.0.is_empty() || multi.unsigned_area() <= 0.0
}

/// Runs a boolean operation, mapping a panic inside the overlay to `None`.
fn guarded<F>(op: F) -> Option<MultiPolygon>
where
    F: FnOnce() -> MultiPolygon,
{
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(result) => Some(result),
        Err(_) => {
            log::warn!("Boolean polygon operation failed");
            None
        }
    }
}
