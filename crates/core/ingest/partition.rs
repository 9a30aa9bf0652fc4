//! Per-species partitions and their summary index.

use crate::error::Result;
use rangewatch_types::{DropCounters, Sighting, SpeciesIndexEntry, SpeciesKey};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Sightings grouped by species, in first-seen species order.
#[derive(Debug, Clone, Default)]
pub struct Partitions {
    groups: Vec<(SpeciesKey, Vec<Sighting>)>,
    positions: FxHashMap<SpeciesKey, usize>,
}

impl Partitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sighting: Sighting) {
        let slot = match self.positions.get(&sighting.species_key) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.positions.insert(sighting.species_key.clone(), slot);
                self.groups.push((sighting.species_key.clone(), Vec::new()));
                slot
            }
        };
        self.groups[slot].1.push(sighting);
    }

    pub fn get(&self, key: &SpeciesKey) -> Option<&[Sighting]> {
        self.positions
            .get(key)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SpeciesKey, &[Sighting])> {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &SpeciesKey> {
        self.groups.iter().map(|(k, _)| k)
    }

    /// Number of species.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total sightings across all species.
    pub fn sighting_count(&self) -> usize {
        self.groups.iter().map(|(_, v)| v.len()).sum()
    }

    /// Rebuilds the summary index from scratch, in partition order.
    pub fn build_index(&self) -> Result<Vec<SpeciesIndexEntry>> {
        self.iter()
            .map(|(key, sightings)| {
                Ok(SpeciesIndexEntry {
                    species_key: key.clone(),
                    count: sightings.len(),
                    byte_size: serialize_partition(sightings)?.len(),
                    latest_timestamp: sightings
                        .iter()
                        .filter_map(|s| s.timestamp.as_deref())
                        .max()
                        .map(str::to_string),
                })
            })
            .collect()
    }
}

impl IntoIterator for Partitions {
    type Item = (SpeciesKey, Vec<Sighting>);
    type IntoIter = std::vec::IntoIter<(SpeciesKey, Vec<Sighting>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// The serialised form of one partition, as written to `<key>.json`.
pub fn serialize_partition(sightings: &[Sighting]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(sightings)?)
}

/// Result of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub partitions: Partitions,
    pub index: Vec<SpeciesIndexEntry>,
    pub stats: DropCounters,
}

/// Serializable run summary, for logs and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    pub species: usize,
    pub sightings: usize,
    pub stats: DropCounters,
}

impl IngestOutput {
    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            species: self.partitions.len(),
            sightings: self.partitions.sighting_count(),
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangewatch_types::SourceKind;

    fn sighting(species: &str, id: &str, timestamp: Option<&str>) -> Sighting {
        Sighting {
            id: id.to_string(),
            species_key: SpeciesKey::normalize(species).unwrap(),
            timestamp: timestamp.map(str::to_string),
            lat: 32.0,
            lon: -110.0,
            source: "iNaturalist".to_string(),
            has_photo: false,
            verified: true,
            source_kind: SourceKind::HumanObservation,
            highlight: timestamp.is_some(),
        }
    }

    #[test]
    fn test_first_seen_order() {
        let mut partitions = Partitions::new();
        partitions.push(sighting("Crotalus viridis", "1", None));
        partitions.push(sighting("Crotalus atrox", "2", None));
        partitions.push(sighting("Crotalus viridis", "3", None));

        let keys: Vec<_> = partitions.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["Crotalus_viridis", "Crotalus_atrox"]);

        let viridis = partitions
            .get(&SpeciesKey::from_normalized("Crotalus_viridis"))
            .unwrap();
        let ids: Vec<_> = viridis.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(partitions.sighting_count(), 3);
    }

    #[test]
    fn test_index_latest_and_size() {
        let mut partitions = Partitions::new();
        partitions.push(sighting("Crotalus atrox", "1", Some("2024-01-01T00:00:00.000Z")));
        partitions.push(sighting("Crotalus atrox", "2", None));
        partitions.push(sighting("Crotalus atrox", "3", Some("2024-03-01T00:00:00.000Z")));
        partitions.push(sighting("Crotalus viridis", "4", None));

        let index = partitions.build_index().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].count, 3);
        assert_eq!(
            index[0].latest_timestamp.as_deref(),
            Some("2024-03-01T00:00:00.000Z")
        );
        assert_eq!(index[1].latest_timestamp, None);

        let atrox = partitions.get(&index[0].species_key).unwrap();
        assert_eq!(index[0].byte_size, serde_json::to_vec(atrox).unwrap().len());
    }
}
