//! Data-quality report over raw occurrence rows.
//!
//! Unlike ingestion, the scan rejects nothing: every row is counted, and the
//! quality counters are tallied over the rows that fall inside the target
//! region (country synonym or region box).

use crate::compute::validation::validate_geographic_point;
use crate::config::Config;
use crate::ingest::columns::{ColumnMap, Field};
use crate::ingest::filters::RegionFilter;
use crate::ingest::record::{RawRow, cell_number, cell_text};
use crate::ingest::timestamp;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use rangewatch_types::SpeciesKey;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static CAPTIVE_HINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(zoo|captive|captiv(e|ity)|pet\s?store|collection|terrarium|museum\s?display)\b")
        .expect("valid regex")
});

/// A standalone 19xx or 20xx year inside free text.
static YEAR_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("valid regex"));

/// Free-text columns searched for a date when no date column parses.
const TEXT_DATE_COLUMNS: [&str; 7] = [
    "voucher",
    "flag_detailed",
    "issue",
    "issues",
    "locality",
    "Remarks",
    "remarks",
];

const BAD_ISSUE_CODES: [&str; 6] = [
    "ZERO_COORDINATE",
    "COORDINATE_OUT_OF_RANGE",
    "COUNTRY_COORDINATE_MISMATCH",
    "COUNTRY_MISMATCH",
    "RECORDED_DATE_INVALID",
    "RECORDED_DATE_MISMATCH",
];

const CAPTIVE_MEANS: [&str; 3] = ["captive", "managed", "captive/managed"];

/// Basis-of-record category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasisBucket {
    HumanObservation,
    Observation,
    MachineObservation,
    PreservedSpecimen,
    FossilSpecimen,
    Other,
}

impl BasisBucket {
    /// Buckets a free-text basis-of-record value.
    pub fn classify(value: &str) -> Self {
        let value = value.trim();
        match value {
            "HumanObservation" => return Self::HumanObservation,
            "Observation" => return Self::Observation,
            "MachineObservation" => return Self::MachineObservation,
            "PreservedSpecimen" => return Self::PreservedSpecimen,
            "FossilSpecimen" => return Self::FossilSpecimen,
            _ => {}
        }

        let upper = value.to_uppercase();
        if upper.contains("HUMAN") {
            Self::HumanObservation
        } else if upper.contains("MACHINE") {
            Self::MachineObservation
        } else if upper.contains("FOSSIL") {
            Self::FossilSpecimen
        } else if upper.contains("PRESERVED") || upper.contains("SPECIMEN") {
            Self::PreservedSpecimen
        } else if upper.contains("OBSERVATION") {
            Self::Observation
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BasisCounts {
    pub human_observation: u64,
    pub observation: u64,
    pub machine_observation: u64,
    pub preserved_specimen: u64,
    pub fossil_specimen: u64,
    pub other: u64,
}

impl BasisCounts {
    fn add(&mut self, bucket: BasisBucket) {
        let slot = match bucket {
            BasisBucket::HumanObservation => &mut self.human_observation,
            BasisBucket::Observation => &mut self.observation,
            BasisBucket::MachineObservation => &mut self.machine_observation,
            BasisBucket::PreservedSpecimen => &mut self.preserved_specimen,
            BasisBucket::FossilSpecimen => &mut self.fossil_specimen,
            BasisBucket::Other => &mut self.other,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u64 {
        self.human_observation
            + self.observation
            + self.machine_observation
            + self.preserved_specimen
            + self.fossil_specimen
            + self.other
    }
}

/// Counters for one species, or for the whole scan.
///
/// Everything except `total_records` and `region_records` counts region rows only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceMetrics {
    pub total_records: u64,
    pub region_records: u64,
    pub dated_any: u64,
    pub dated_full: u64,
    pub recent: u64,
    pub valid_coords: u64,
    pub uncertainty_within: u64,
    pub issue_flagged: u64,
    pub captive_flagged: u64,
    pub has_media: u64,
    pub basis_counts: BasisCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesMetrics {
    pub species_key: SpeciesKey,
    #[serde(flatten)]
    pub counts: OccurrenceMetrics,
    pub pct_dated_any: f64,
    pub pct_dated_full: f64,
    pub pct_recent: f64,
    pub pct_uncertainty_within: f64,
    pub pct_captive_flagged: f64,
}

impl SpeciesMetrics {
    fn new(species_key: SpeciesKey, counts: OccurrenceMetrics) -> Self {
        let denominator = counts.region_records.max(1) as f64;
        let pct = |n: u64| ((n as f64 / denominator) * 10_000.0).round() / 10_000.0;
        Self {
            pct_dated_any: pct(counts.dated_any),
            pct_dated_full: pct(counts.dated_full),
            pct_recent: pct(counts.recent),
            pct_uncertainty_within: pct(counts.uncertainty_within),
            pct_captive_flagged: pct(counts.captive_flagged),
            species_key,
            counts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Sorted by species key
    pub by_species: Vec<SpeciesMetrics>,
    pub overall: OccurrenceMetrics,
}

/// Quality flags of one region row.
#[derive(Debug, Default)]
struct RowFlags {
    dated_any: bool,
    dated_full: bool,
    recent: bool,
    valid_coords: bool,
    uncertainty_within: bool,
    issue_flagged: bool,
    captive_flagged: bool,
    has_media: bool,
    basis: Option<BasisBucket>,
}

impl OccurrenceMetrics {
    fn record(&mut self, flags: Option<&RowFlags>) {
        self.total_records += 1;
        let Some(flags) = flags else {
            return;
        };
        self.region_records += 1;
        self.dated_any += u64::from(flags.dated_any);
        self.dated_full += u64::from(flags.dated_full);
        self.recent += u64::from(flags.recent);
        self.valid_coords += u64::from(flags.valid_coords);
        self.uncertainty_within += u64::from(flags.uncertainty_within);
        self.issue_flagged += u64::from(flags.issue_flagged);
        self.captive_flagged += u64::from(flags.captive_flagged);
        self.has_media += u64::from(flags.has_media);
        self.basis_counts
            .add(flags.basis.unwrap_or(BasisBucket::Other));
    }
}

struct Scanner<'a> {
    columns: ColumnMap,
    text_date_columns: Vec<&'static str>,
    region: RegionFilter,
    config: &'a Config,
    recent_since: Option<DateTime<Utc>>,
}

impl Scanner<'_> {
    /// First date found in the date columns, else in the free-text columns.
    fn observed(&self, row: &RawRow) -> Option<DateTime<Utc>> {
        let from_columns = self
            .columns
            .date_columns()
            .iter()
            .filter_map(|name| row.get(name))
            .find_map(timestamp::parse_date_cell);
        if from_columns.is_some() {
            return from_columns;
        }

        let blob = self
            .text_date_columns
            .iter()
            .filter_map(|name| row.get(*name).and_then(cell_text))
            .collect::<Vec<_>>()
            .join(" ");
        if blob.is_empty() {
            return None;
        }
        timestamp::parse_date_text(&blob).or_else(|| {
            let year = YEAR_IN_TEXT.captures(&blob)?.get(1)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(year, 1, 1)?
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
        })
    }

    fn has_date_text(&self, row: &RawRow) -> bool {
        self.columns
            .date_columns()
            .iter()
            .any(|name| row.get(name).and_then(cell_text).is_some())
    }

    fn flags(&self, row: &RawRow) -> Option<RowFlags> {
        let value = |field: Field| self.columns.get(row, field);
        let text = |field: Field| value(field).and_then(cell_text);
        let number = |field: Field| value(field).and_then(cell_number).filter(|n| !n.is_nan());

        let lat = number(Field::Latitude);
        let lon = number(Field::Longitude);
        let country = text(Field::Country);
        let in_region = country
            .as_deref()
            .is_some_and(|c| self.region.matches_country(c))
            || matches!((lat, lon), (Some(lat), Some(lon)) if self.region.contains(lon, lat));
        if !in_region {
            return None;
        }

        let year = number(Field::Year);
        let direct = self.observed(row);
        let has_all_parts =
            year.is_some() && number(Field::Month).is_some() && number(Field::Day).is_some();
        let since_year = f64::from(self.config.metrics.recent_since_year);

        let captive_means = text(Field::EstablishmentMeans)
            .is_some_and(|means| CAPTIVE_MEANS.contains(&means.to_lowercase().as_str()));
        let hint_text = [Field::Remarks, Field::Locality, Field::Habitat]
            .into_iter()
            .filter_map(text)
            .collect::<Vec<_>>()
            .join(" ");

        Some(RowFlags {
            dated_any: self.has_date_text(row) || direct.is_some() || year.is_some(),
            dated_full: direct.is_some() || has_all_parts,
            recent: matches!((&direct, &self.recent_since), (Some(ts), Some(since)) if ts >= since)
                || year.is_some_and(|y| y >= since_year),
            valid_coords: matches!((lat, lon), (Some(lat), Some(lon)) if validate_geographic_point(lon, lat).is_ok()),
            uncertainty_within: number(Field::Uncertainty)
                .is_some_and(|m| m <= self.config.metrics.uncertainty_limit_m),
            issue_flagged: text(Field::Issues).is_some_and(|issues| {
                let upper = issues.to_uppercase();
                BAD_ISSUE_CODES.iter().any(|code| upper.contains(code))
            }),
            captive_flagged: captive_means || CAPTIVE_HINTS.is_match(&hint_text),
            has_media: text(Field::Media).is_some(),
            basis: text(Field::BasisOfRecord).map(|basis| BasisBucket::classify(&basis)),
        })
    }
}

/// Scans `rows` and reports per-species and overall quality counters.
///
/// Columns are resolved from the first row, as in ingestion. Rows whose
/// species is blank count toward `overall` only.
pub fn scan_metrics(rows: &[RawRow], config: &Config) -> MetricsReport {
    let mut overall = OccurrenceMetrics::default();
    let mut by_species: BTreeMap<SpeciesKey, OccurrenceMetrics> = BTreeMap::new();

    if let Some(first) = rows.first() {
        let scanner = Scanner {
            columns: ColumnMap::resolve(first),
            text_date_columns: TEXT_DATE_COLUMNS
                .into_iter()
                .filter(|name| first.contains_key(*name))
                .collect(),
            region: RegionFilter::new(
                &config.ingest.country_synonyms,
                &config.ingest.region_boxes,
            ),
            config,
            recent_since: NaiveDate::from_ymd_opt(config.metrics.recent_since_year, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc()),
        };

        for row in rows {
            let flags = scanner.flags(row);
            overall.record(flags.as_ref());

            let species = scanner
                .columns
                .get(row, Field::Species)
                .and_then(cell_text)
                .and_then(|name| SpeciesKey::normalize(&name));
            if let Some(key) = species {
                by_species.entry(key).or_default().record(flags.as_ref());
            }
        }
    }

    log::debug!(
        "Scanned {} rows ({} in region) across {} species",
        overall.total_records,
        overall.region_records,
        by_species.len()
    );

    MetricsReport {
        by_species: by_species
            .into_iter()
            .map(|(key, counts)| SpeciesMetrics::new(key, counts))
            .collect(),
        overall,
    }
}
