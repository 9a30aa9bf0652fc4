use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rangewatch::compute::geojson::parse_range_document;
use rangewatch::{
    BoundingBox, DirectoryRangeStore, EngineBuilder, Ingestor, PartitionWriter, RangeStore,
    SpeciesKey, bbox_table, scan_metrics,
};
use std::path::PathBuf;
use tracing::{info, warn};

mod input;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON or TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter, dedup and partition occurrence rows
    Ingest {
        /// JSON array or NDJSON of occurrence rows
        #[arg(short, long)]
        rows: PathBuf,

        /// JSON array of allowed species names
        #[arg(short, long)]
        allow: PathBuf,

        #[arg(short, long)]
        out: PathBuf,

        /// Recency reference time (RFC 3339); defaults to now
        #[arg(long)]
        reference_time: Option<DateTime<Utc>>,
    },

    /// Compute bbox_table.json from a directory of <species>.geojson files
    BboxTable {
        #[arg(short, long)]
        ranges: PathBuf,

        /// Output directory; defaults to the ranges directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Per-species data-quality report over occurrence rows
    Metrics {
        #[arg(short, long)]
        rows: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Rank species ranges by overlap with a viewport
    Rank {
        #[arg(short, long)]
        ranges: PathBuf,

        /// min_lon,min_lat,max_lon,max_lat
        #[arg(long, value_delimiter = ',', num_args = 4, allow_negative_numbers = true)]
        viewport: Vec<f64>,

        #[arg(long)]
        budget: Option<usize>,

        species: Vec<String>,
    },

    /// Print the range shared by every listed species as GeoJSON
    Shared {
        #[arg(short, long)]
        ranges: PathBuf,

        #[arg(required = true, num_args = 2..)]
        species: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rangewatch=info,info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = input::read_config(args.config.as_deref())?;

    match args.command {
        Command::Ingest {
            rows,
            allow,
            out,
            reference_time,
        } => {
            let rows = input::read_rows(&rows)?;
            let allowed = input::read_allow_list(&allow)?;
            let reference_time = reference_time.unwrap_or_else(Utc::now);
            info!(
                "Ingesting {} rows for {} allowed species",
                rows.len(),
                allowed.len()
            );

            let output = Ingestor::new(config.ingest).ingest(&rows, &allowed, reference_time)?;
            let written = PartitionWriter::new(&out).write(&output)?;
            info!("Wrote {} files to {}", written.len(), out.display());
            println!("{}", serde_json::to_string_pretty(&output.summary())?);
        }

        Command::BboxTable { ranges, out } => {
            let store = DirectoryRangeStore::new(&ranges);
            let mut documents = Vec::new();
            for key in store.species()? {
                match parse_range_document(store.load_range(&key)?) {
                    Some(document) => documents.push((key, document)),
                    None => warn!("Skipping {}: not a GeoJSON document", key),
                }
            }
            let table = bbox_table(documents);
            let path = PartitionWriter::new(out.unwrap_or(ranges)).write_bbox_table(&table)?;
            info!("Wrote {} entries to {}", table.len(), path.display());
        }

        Command::Metrics { rows, out } => {
            let rows = input::read_rows(&rows)?;
            let report = scan_metrics(&rows, &config);
            let json = serde_json::to_string_pretty(&report)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(
                        "Wrote metrics for {} species to {}",
                        report.by_species.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }

        Command::Rank {
            ranges,
            viewport,
            budget,
            species,
        } => {
            let [min_x, min_y, max_x, max_y] = viewport[..] else {
                anyhow::bail!("viewport needs exactly four numbers");
            };
            let engine = EngineBuilder::new().directory(ranges).config(config).build()?;
            let keys = species_keys(&species);
            let ranked = engine.rank_species(
                &keys,
                &BoundingBox::new(min_x, min_y, max_x, max_y),
                budget,
            );
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }

        Command::Shared { ranges, species } => {
            let engine = EngineBuilder::new().directory(ranges).config(config).build()?;
            let keys = species_keys(&species);
            match engine.common_range(&keys) {
                Some(shared) => println!("{}", serde_json::to_string_pretty(&shared)?),
                None => info!("No shared range for {} species", keys.len()),
            }
        }
    }

    Ok(())
}

fn species_keys(names: &[String]) -> Vec<SpeciesKey> {
    names.iter().filter_map(|n| SpeciesKey::normalize(n)).collect()
}
