//! Per-run duplicate detection.

use rangewatch_types::SpeciesKey;
use rustc_hash::FxHashSet;

/// Identity of a sighting for duplicate detection: species, rounded position
/// and UTC day. Rows without a date share the `None` day bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub species_key: SpeciesKey,
    pub lat: i64,
    pub lon: i64,
    pub day: Option<i64>,
}

impl DedupKey {
    pub fn new(species_key: SpeciesKey, lat: f64, lon: f64, decimals: u32, day: Option<i64>) -> Self {
        let scale = 10f64.powi(decimals as i32);
        Self {
            species_key,
            lat: (lat * scale).round() as i64,
            lon: (lon * scale).round() as i64,
            day,
        }
    }
}

/// Keys seen so far in one ingestion run.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: FxHashSet<DedupKey>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key`; returns `false` if it was already present.
    pub fn insert(&mut self, key: DedupKey) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
