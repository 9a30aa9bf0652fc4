//! Row predicates and derived-field classifiers for ingestion.

use once_cell::sync::Lazy;
use rangewatch_types::{BoundingBox, SourceKind};
use regex::Regex;

static VERIFIED_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)inat|gbif|herp|human").expect("valid regex"));

static PRESERVED_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)preserved|specimen|museum").expect("valid regex"));

static HUMAN_OBSERVATION_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)human|observation|inat|gbif|herp").expect("valid regex"));

const PHOTO_TERMS: [&str; 5] = ["true", "photo", "image", "photograph", "voucher"];

/// Country-or-region membership test.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    synonyms: Vec<String>,
    boxes: Vec<BoundingBox>,
}

impl RegionFilter {
    pub fn new<S: AsRef<str>>(synonyms: &[S], boxes: &[BoundingBox]) -> Self {
        Self {
            synonyms: synonyms
                .iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
            boxes: boxes.to_vec(),
        }
    }

    /// Country text matching a synonym, trimmed and case-insensitive.
    pub fn matches_country(&self, country: &str) -> bool {
        let country = country.trim().to_lowercase();
        !country.is_empty() && self.synonyms.contains(&country)
    }

    /// Point inside any region box, edges inclusive.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.boxes.iter().any(|b| b.contains(lon, lat))
    }

    pub fn accepts(&self, country: Option<&str>, lon: f64, lat: f64) -> bool {
        country.is_some_and(|c| self.matches_country(c)) || self.contains(lon, lat)
    }
}

pub fn is_captive(establishment_means: &str) -> bool {
    let lower = establishment_means.to_lowercase();
    lower.contains("captive") || lower.contains("cultivated")
}

pub fn is_fossil_or_preserved(basis_of_record: &str) -> bool {
    let lower = basis_of_record.to_lowercase();
    lower.contains("fossil") || lower.contains("preserved")
}

pub fn is_preserved_source(source: &str) -> bool {
    PRESERVED_SOURCE.is_match(source)
}

pub fn is_verified_source(source: &str) -> bool {
    VERIFIED_SOURCE.is_match(source)
}

pub fn has_photo(media: &str) -> bool {
    let lower = media.to_lowercase();
    PHOTO_TERMS.iter().any(|term| lower.contains(term))
}

pub fn source_kind(source: &str) -> SourceKind {
    if PRESERVED_SOURCE.is_match(source) {
        SourceKind::PreservedSpecimen
    } else if HUMAN_OBSERVATION_SOURCE.is_match(source) {
        SourceKind::HumanObservation
    } else {
        SourceKind::Other
    }
}

/// Truncates to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
