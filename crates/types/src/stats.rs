use serde::{Deserialize, Serialize};

/// Per-run ingestion counters.
///
/// Silent rejects (species not allowed, captive/fossil/specimen records) are
/// not counted in any drop bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounters {
    /// Every input row seen
    pub rows_read: u64,
    pub dropped_coords: u64,
    pub dropped_country: u64,
    pub dropped_old: u64,
    pub dropped_uncert: u64,
    pub deduped: u64,
    /// Rows that became sightings
    pub kept: u64,
}

impl DropCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all counted drops.
    pub fn dropped(&self) -> u64 {
        self.dropped_coords
            + self.dropped_country
            + self.dropped_old
            + self.dropped_uncert
            + self.deduped
    }

    /// Rows rejected without a counter.
    pub fn silently_rejected(&self) -> u64 {
        self.rows_read
            .saturating_sub(self.kept)
            .saturating_sub(self.dropped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_rejects_are_the_remainder() {
        let stats = DropCounters {
            rows_read: 10,
            dropped_coords: 1,
            dropped_country: 2,
            dropped_old: 0,
            dropped_uncert: 1,
            deduped: 1,
            kept: 3,
        };
        assert_eq!(stats.dropped(), 5);
        assert_eq!(stats.silently_rejected(), 2);
    }
}
