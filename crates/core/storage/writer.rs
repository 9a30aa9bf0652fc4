//! Persists ingestion output and the bbox table as JSON documents.

use crate::error::Result;
use crate::ingest::partition::{IngestOutput, serialize_partition};
use rangewatch_types::{BoundingBox, SpeciesKey};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const INDEX_FILE: &str = "index.json";
pub const BBOX_TABLE_FILE: &str = "bbox_table.json";

/// Writes `<key>.json` per species plus `index.json` into one directory.
///
/// Each file is written to a `.tmp` sibling and renamed into place.
#[derive(Debug, Clone)]
pub struct PartitionWriter {
    root: PathBuf,
}

impl PartitionWriter {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes every partition and the index; returns the paths written.
    pub fn write(&self, output: &IngestOutput) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.root)?;

        let mut written = Vec::with_capacity(output.partitions.len() + 1);
        for (key, sightings) in output.partitions.iter() {
            let path = self.root.join(format!("{key}.json"));
            write_atomic(&path, &serialize_partition(sightings)?)?;
            written.push(path);
        }

        let index_path = self.root.join(INDEX_FILE);
        write_atomic(&index_path, &serde_json::to_vec_pretty(&output.index)?)?;
        written.push(index_path);

        log::debug!(
            "Wrote {} partitions to {}",
            output.partitions.len(),
            self.root.display()
        );
        Ok(written)
    }

    pub fn write_bbox_table(&self, table: &BTreeMap<SpeciesKey, BoundingBox>) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(BBOX_TABLE_FILE);
        write_atomic(&path, &serde_json::to_vec_pretty(table)?)?;
        Ok(path)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    let file: File = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}
