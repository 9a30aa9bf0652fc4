//! Occurrence ingestion: column resolution, the filter chain, dedup,
//! per-species partitioning and the metrics scan.

pub mod columns;
pub mod dedup;
pub mod filters;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod record;
pub mod timestamp;

pub use columns::{ColumnMap, Field};
pub use metrics::{MetricsReport, OccurrenceMetrics, SpeciesMetrics, scan_metrics};
pub use partition::{IngestOutput, IngestSummary, Partitions};
pub use pipeline::{Ingestor, ingest};
pub use record::RawRow;
