//! Configuration for ingestion, the range engine and the metrics scan.
//!
//! Every field has a default, so an empty JSON object is a valid config.
use crate::error::{RangeError, Result};
use serde::de::Error;

pub use rangewatch_types::bbox::BoundingBox;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Filter thresholds and geography for the ingestion pipeline
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Sightings older than this many days (relative to the reference time) are dropped
    #[serde(default = "IngestConfig::default_recency_window_days")]
    pub recency_window_days: u32,

    /// Coordinate uncertainty above this many meters is dropped
    #[serde(default = "IngestConfig::default_max_uncertainty_m")]
    pub max_uncertainty_m: f64,

    /// Decimal places kept on lat/lon; also the dedup rounding precision
    #[serde(default = "IngestConfig::default_coordinate_decimals")]
    pub coordinate_decimals: u32,

    #[serde(default = "IngestConfig::default_source_max_chars")]
    pub source_max_chars: usize,

    /// Country codes or names accepted as inside the target region
    #[serde(default = "IngestConfig::default_country_synonyms")]
    pub country_synonyms: Vec<String>,

    /// Fallback containment test when the country field does not match
    #[serde(default = "IngestConfig::default_region_boxes")]
    pub region_boxes: Vec<BoundingBox>,
}

impl IngestConfig {
    const fn default_recency_window_days() -> u32 {
        365
    }

    const fn default_max_uncertainty_m() -> f64 {
        50_000.0
    }

    const fn default_coordinate_decimals() -> u32 {
        5
    }

    const fn default_source_max_chars() -> usize {
        120
    }

    fn default_country_synonyms() -> Vec<String> {
        ["US", "USA", "United States", "United States of America"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn default_region_boxes() -> Vec<BoundingBox> {
        vec![
            // Lower 48
            BoundingBox::new(-125.0, 24.0, -66.0, 50.0),
            // Alaska
            BoundingBox::new(-179.5, 51.0, -129.0, 72.0),
            // Hawaii
            BoundingBox::new(-161.0, 18.0, -154.0, 23.0),
        ]
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            recency_window_days: Self::default_recency_window_days(),
            max_uncertainty_m: Self::default_max_uncertainty_m(),
            coordinate_decimals: Self::default_coordinate_decimals(),
            source_max_chars: Self::default_source_max_chars(),
            country_synonyms: Self::default_country_synonyms(),
            region_boxes: Self::default_region_boxes(),
        }
    }
}

/// Settings for the range engine
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Uncached lookups `rank_overlap` may spend per call when the caller passes no budget
    #[serde(default = "EngineConfig::default_missing_fetch_budget")]
    pub missing_fetch_budget: usize,
}

impl EngineConfig {
    const fn default_missing_fetch_budget() -> usize {
        8
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missing_fetch_budget: Self::default_missing_fetch_budget(),
        }
    }
}

/// Thresholds for the occurrence metrics scan
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default = "MetricsConfig::default_recent_since_year")]
    pub recent_since_year: i32,

    #[serde(default = "MetricsConfig::default_uncertainty_limit_m")]
    pub uncertainty_limit_m: f64,
}

impl MetricsConfig {
    const fn default_recent_since_year() -> i32 {
        2010
    }

    const fn default_uncertainty_limit_m() -> f64 {
        2000.0
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            recent_since_year: Self::default_recent_since_year(),
            uncertainty_limit_m: Self::default_uncertainty_limit_m(),
        }
    }
}

impl Config {
    pub fn with_recency_window_days(mut self, days: u32) -> Self {
        assert!(days > 0, "Recency window must be greater than zero");
        self.ingest.recency_window_days = days;
        self
    }

    pub fn with_max_uncertainty_m(mut self, meters: f64) -> Self {
        assert!(
            meters.is_finite() && meters > 0.0,
            "Uncertainty threshold must be positive"
        );
        self.ingest.max_uncertainty_m = meters;
        self
    }

    pub fn with_region_boxes(mut self, boxes: Vec<BoundingBox>) -> Self {
        self.ingest.region_boxes = boxes;
        self
    }

    pub fn with_country_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingest.country_synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_missing_fetch_budget(mut self, budget: usize) -> Self {
        self.engine.missing_fetch_budget = budget;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let ingest = &self.ingest;

        if ingest.recency_window_days == 0 {
            return Err("Recency window must be greater than zero".to_string());
        }

        if !(ingest.max_uncertainty_m.is_finite() && ingest.max_uncertainty_m > 0.0) {
            return Err(format!(
                "Uncertainty threshold must be positive, got: {}",
                ingest.max_uncertainty_m
            ));
        }

        if ingest.coordinate_decimals > 9 {
            return Err(format!(
                "Coordinate decimals must be in 0..=9, got: {}",
                ingest.coordinate_decimals
            ));
        }

        if ingest.region_boxes.is_empty() && ingest.country_synonyms.is_empty() {
            return Err("At least one region box or country synonym is required".to_string());
        }

        if self.metrics.uncertainty_limit_m < 0.0 {
            return Err("Metrics uncertainty limit must not be negative".to_string());
        }

        Ok(())
    }

    /// Validate, converting the message into the crate error.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(RangeError::Config)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            engine: EngineConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}
