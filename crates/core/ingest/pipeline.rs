//! The occurrence ingestion run: raw rows in, partitioned sightings out.

use crate::compute::validation::validate_geographic_point;
use crate::config::IngestConfig;
use crate::error::{RangeError, Result};
use crate::ingest::columns::{ColumnMap, Field};
use crate::ingest::dedup::{DedupKey, DedupSet};
use crate::ingest::filters::{self, RegionFilter};
use crate::ingest::partition::{IngestOutput, Partitions};
use crate::ingest::record::{RawRow, cell_number, cell_text};
use crate::ingest::timestamp;
use chrono::{DateTime, Utc};
use rangewatch_types::{DropCounters, Sighting, SourceKind, SpeciesKey};
use std::collections::HashSet;
use std::hash::BuildHasher;

/// Why a row did not become a sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reject {
    /// Not counted
    Silent,
    Coords,
    Country,
    Old,
    Uncertainty,
    Duplicate,
}

/// Runs the ingestion filter chain with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: IngestConfig,
    region: RegionFilter,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        let region = RegionFilter::new(&config.country_synonyms, &config.region_boxes);
        Self { config, region }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Filters, deduplicates and partitions `rows`.
    ///
    /// Column names are resolved from the first row. Recency is measured
    /// against `reference_time`. Fails with [`RangeError::NoUsableRows`] when
    /// no row survives, including for empty input.
    pub fn ingest<H: BuildHasher>(
        &self,
        rows: &[RawRow],
        allowed: &HashSet<SpeciesKey, H>,
        reference_time: DateTime<Utc>,
    ) -> Result<IngestOutput> {
        let mut stats = DropCounters::new();
        let Some(first) = rows.first() else {
            return Err(RangeError::NoUsableRows { stats });
        };

        let columns = ColumnMap::resolve(first);
        let mut seen = DedupSet::new();
        let mut partitions = Partitions::new();

        for (row_index, row) in rows.iter().enumerate() {
            stats.rows_read += 1;
            match self.process_row(&columns, row, row_index, allowed, &reference_time, &mut seen) {
                Ok(sighting) => {
                    stats.kept += 1;
                    partitions.push(sighting);
                }
                Err(Reject::Silent) => {}
                Err(Reject::Coords) => stats.dropped_coords += 1,
                Err(Reject::Country) => stats.dropped_country += 1,
                Err(Reject::Old) => stats.dropped_old += 1,
                Err(Reject::Uncertainty) => stats.dropped_uncert += 1,
                Err(Reject::Duplicate) => stats.deduped += 1,
            }
        }

        log::debug!(
            "Ingested {} of {} rows into {} species (coords={}, country={}, old={}, uncert={}, dup={}, silent={})",
            stats.kept,
            stats.rows_read,
            partitions.len(),
            stats.dropped_coords,
            stats.dropped_country,
            stats.dropped_old,
            stats.dropped_uncert,
            stats.deduped,
            stats.silently_rejected()
        );

        if partitions.is_empty() {
            return Err(RangeError::NoUsableRows { stats });
        }

        let index = partitions.build_index()?;
        Ok(IngestOutput {
            partitions,
            index,
            stats,
        })
    }

    fn process_row<H: BuildHasher>(
        &self,
        columns: &ColumnMap,
        row: &RawRow,
        row_index: usize,
        allowed: &HashSet<SpeciesKey, H>,
        reference_time: &DateTime<Utc>,
        seen: &mut DedupSet,
    ) -> std::result::Result<Sighting, Reject> {
        let text = |field: Field| columns.get(row, field).and_then(cell_text);
        let number = |field: Field| columns.get(row, field).and_then(cell_number);

        let species_key = text(Field::Species)
            .and_then(|name| SpeciesKey::normalize(&name))
            .filter(|key| allowed.contains(key))
            .ok_or(Reject::Silent)?;

        let (lat, lon) = match (number(Field::Latitude), number(Field::Longitude)) {
            (Some(lat), Some(lon)) if validate_geographic_point(lon, lat).is_ok() => (lat, lon),
            _ => return Err(Reject::Coords),
        };

        if !self.region.accepts(text(Field::Country).as_deref(), lon, lat) {
            return Err(Reject::Country);
        }

        let observed = timestamp::resolve(
            columns.get(row, Field::Date),
            columns.get(row, Field::Year),
            columns.get(row, Field::Month),
            columns.get(row, Field::Day),
        );
        if let Some(ts) = &observed
            && timestamp::age_days(ts, reference_time) > f64::from(self.config.recency_window_days)
        {
            return Err(Reject::Old);
        }

        if number(Field::Uncertainty)
            .is_some_and(|m| m.is_finite() && m > self.config.max_uncertainty_m)
        {
            return Err(Reject::Uncertainty);
        }

        if text(Field::EstablishmentMeans).is_some_and(|means| filters::is_captive(&means)) {
            return Err(Reject::Silent);
        }
        if text(Field::BasisOfRecord).is_some_and(|basis| filters::is_fossil_or_preserved(&basis)) {
            return Err(Reject::Silent);
        }
        let source = text(Field::Source).unwrap_or_default();
        if filters::is_preserved_source(&source) {
            return Err(Reject::Silent);
        }

        let decimals = self.config.coordinate_decimals;
        let day = observed.as_ref().map(timestamp::unix_day);
        if !seen.insert(DedupKey::new(species_key.clone(), lat, lon, decimals, day)) {
            return Err(Reject::Duplicate);
        }

        let has_photo = text(Field::Media).is_some_and(|media| filters::has_photo(&media));
        let source_kind = filters::source_kind(&source);
        let id = text(Field::Id)
            .map(|id| id.into_owned())
            .unwrap_or_else(|| format!("{species_key}:{row_index}"));

        Ok(Sighting {
            id,
            timestamp: observed.as_ref().map(timestamp::format_iso),
            lat: round_to(lat, decimals),
            lon: round_to(lon, decimals),
            verified: filters::is_verified_source(&source),
            source: filters::truncate_chars(&source, self.config.source_max_chars),
            has_photo,
            highlight: has_photo
                || (observed.is_some() && source_kind != SourceKind::PreservedSpecimen),
            source_kind,
            species_key,
        })
    }
}

/// Ingests with the default configuration.
pub fn ingest<H: BuildHasher>(
    rows: &[RawRow],
    allowed: &HashSet<SpeciesKey, H>,
    reference_time: DateTime<Utc>,
) -> Result<IngestOutput> {
    Ingestor::default().ingest(rows, allowed, reference_time)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
