use crate::species::SpeciesKey;
use serde::{Deserialize, Serialize};

/// Coarse provenance of a sighting, derived from its source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    PreservedSpecimen,
    HumanObservation,
    #[default]
    Other,
}

/// A cleaned, deduplicated occurrence. Produced once per surviving input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: String,
    pub species_key: SpeciesKey,
    /// UTC, `YYYY-MM-DDTHH:MM:SS.mmmZ`; `None` when the date is unknown
    pub timestamp: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub source: String,
    pub has_photo: bool,
    pub verified: bool,
    pub source_kind: SourceKind,
    pub highlight: bool,
}

/// Summary of one species partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesIndexEntry {
    pub species_key: SpeciesKey,
    pub count: usize,
    /// Length of the serialised partition document
    pub byte_size: usize,
    pub latest_timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&SourceKind::PreservedSpecimen).unwrap(),
            "\"preserved_specimen\""
        );
        assert_eq!(
            serde_json::to_string(&SourceKind::HumanObservation).unwrap(),
            "\"human_observation\""
        );
        assert_eq!(serde_json::to_string(&SourceKind::Other).unwrap(), "\"other\"");
    }
}
