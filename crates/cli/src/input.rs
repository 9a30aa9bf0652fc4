//! File readers for rows, allow-lists and configuration.

use anyhow::{Context, bail};
use rangewatch::{Config, RawRow, SpeciesKey};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Reads rows from a JSON array of objects, or NDJSON with one object per line.
///
/// Blank NDJSON lines are skipped; non-object entries are an error.
pub fn read_rows(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_rows(&text).with_context(|| format!("parsing rows from {}", path.display()))
}

pub fn parse_rows(text: &str) -> anyhow::Result<Vec<RawRow>> {
    if text.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(text)?;
        return values.into_iter().enumerate().map(|(i, v)| into_row(v, i + 1)).collect();
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value: Value =
                serde_json::from_str(line).with_context(|| format!("line {}", i + 1))?;
            into_row(value, i + 1)
        })
        .collect()
}

fn into_row(value: Value, position: usize) -> anyhow::Result<RawRow> {
    match value {
        Value::Object(row) => Ok(row),
        other => bail!("row {position} is not an object: {other}"),
    }
}

/// Reads a JSON array of species names and normalizes them.
pub fn read_allow_list(path: &Path) -> anyhow::Result<HashSet<SpeciesKey>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let names: Vec<String> = serde_json::from_str(&text)
        .with_context(|| format!("parsing allow-list {}", path.display()))?;
    Ok(names.iter().filter_map(|n| SpeciesKey::normalize(n)).collect())
}

/// Loads a JSON or TOML config (by extension), or the defaults.
pub fn read_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        Config::from_toml(&text)?
    } else {
        Config::from_json(&text)?
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let rows = parse_rows(r#"[{"species":"a"},{"species":"b"}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["species"], "b");
    }

    #[test]
    fn test_parse_ndjson() {
        let rows = parse_rows("{\"species\":\"a\"}\n\n{\"species\":\"b\"}\n").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(parse_rows("[1, 2]").is_err());
        assert!(parse_rows("{\"species\":\"a\"}\nnot json").is_err());
    }

    #[test]
    fn test_allow_list_is_normalized() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("allow.json");
        fs::write(&path, r#"["Crotalus  atrox", " "]"#).unwrap();

        let allowed = read_allow_list(&path).unwrap();
        assert_eq!(allowed.len(), 1);
        assert!(allowed.contains(&SpeciesKey::from_normalized("Crotalus_atrox")));
    }

    #[test]
    fn test_config_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let toml_path = dir.path().join("config.toml");
        fs::write(&toml_path, "[engine]\nmissing_fetch_budget = 3\n").unwrap();
        assert_eq!(read_config(Some(&toml_path)).unwrap().engine.missing_fetch_budget, 3);

        let json_path = dir.path().join("config.json");
        fs::write(&json_path, r#"{"ingest":{"recency_window_days":30}}"#).unwrap();
        assert_eq!(read_config(Some(&json_path)).unwrap().ingest.recency_window_days, 30);

        assert_eq!(read_config(None).unwrap(), Config::default());
    }
}
