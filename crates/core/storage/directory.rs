//! Range store reading documents from a directory.

use super::{BBOX_TABLE_FILE, RangeStore};
use crate::error::{RangeError, Result};
use rangewatch_types::{BoundingBox, SpeciesKey};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads `<dir>/<species_key>.geojson` and `<dir>/bbox_table.json`.
#[derive(Debug, Clone)]
pub struct DirectoryRangeStore {
    root: PathBuf,
}

impl DirectoryRangeStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn range_path(&self, key: &SpeciesKey) -> PathBuf {
        self.root.join(format!("{key}.geojson"))
    }

    /// Species keys with a range document in the directory, sorted.
    pub fn species(&self) -> Result<Vec<SpeciesKey>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("geojson") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(SpeciesKey::from_normalized(stem));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl RangeStore for DirectoryRangeStore {
    fn load_range(&self, key: &SpeciesKey) -> Result<serde_json::Value> {
        if key.as_str().contains(['/', '\\']) || key.as_str().starts_with('.') {
            return Err(RangeError::InvalidInput(format!("invalid species key: {key}")));
        }
        let bytes = match fs::read(self.range_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RangeError::RangeNotFound(key.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn load_bbox_table(&self) -> Result<HashMap<SpeciesKey, BoundingBox>> {
        let bytes = fs::read(self.root.join(BBOX_TABLE_FILE))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_documents_and_table() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Crotalus_atrox.geojson"),
            r#"{"type":"Point","coordinates":[-110.0,32.0]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(BBOX_TABLE_FILE),
            r#"{"Crotalus_atrox":[-117.0,22.0,-93.0,38.0]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = DirectoryRangeStore::new(dir.path());
        let key = SpeciesKey::from_normalized("Crotalus_atrox");

        assert_eq!(store.load_range(&key).unwrap()["type"], "Point");
        assert_eq!(
            store.load_bbox_table().unwrap()[&key],
            BoundingBox::new(-117.0, 22.0, -93.0, 38.0)
        );
        assert_eq!(store.species().unwrap(), vec![key]);
    }

    #[test]
    fn test_missing_and_invalid_keys() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryRangeStore::new(dir.path());

        assert!(matches!(
            store.load_range(&SpeciesKey::from_normalized("Missing")),
            Err(RangeError::RangeNotFound(_))
        ));
        assert!(matches!(
            store.load_range(&SpeciesKey::from_normalized("../etc")),
            Err(RangeError::InvalidInput(_))
        ));
        assert!(matches!(store.load_bbox_table(), Err(RangeError::Io(_))));
    }
}
