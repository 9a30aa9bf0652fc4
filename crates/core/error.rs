//! Error types for rangewatch.

use rangewatch_types::{DropCounters, SpeciesKey};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RangeError>;

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("no range document for species {0}")]
    RangeNotFound(SpeciesKey),

    /// Ingestion produced no sightings at all.
    #[error("no usable occurrence rows ({} read)", .stats.rows_read)]
    NoUsableRows { stats: DropCounters },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
