use rangewatch::compute::geojson::parse_range_document;
use rangewatch::{
    BoundingBox, DirectoryRangeStore, EngineBuilder, PartitionWriter, RangeStore, SpeciesKey,
    bbox_table,
};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn write_range(dir: &TempDir, name: &str, x0: f64, y0: f64, x1: f64, y1: f64) {
    let document = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "name": name },
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]]
            }
        }]
    });
    fs::write(
        dir.path().join(format!("{name}.geojson")),
        serde_json::to_vec(&document).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_bbox_table_build_then_preload() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    write_range(&dir, "Crotalus_atrox", -117.0, 22.0, -93.0, 38.0);
    write_range(&dir, "Crotalus_viridis", -114.0, 31.0, -96.0, 53.0);

    let store = DirectoryRangeStore::new(dir.path());
    let documents = store
        .species()
        .unwrap()
        .into_iter()
        .map(|key| {
            let document = parse_range_document(store.load_range(&key).unwrap()).unwrap();
            (key, document)
        });
    let table = bbox_table(documents);
    assert_eq!(table.len(), 2);
    PartitionWriter::new(dir.path()).write_bbox_table(&table).unwrap();

    // Documents removed after the table was written are still answered from it.
    fs::remove_file(dir.path().join("Crotalus_atrox.geojson")).unwrap();

    let engine = EngineBuilder::new().directory(dir.path()).build().unwrap();
    let atrox = SpeciesKey::from_normalized("Crotalus_atrox");
    assert_eq!(
        engine.get_or_load(&atrox),
        Some(BoundingBox::new(-117.0, 22.0, -93.0, 38.0))
    );
    assert!(engine.stats().preload_attempted);
    assert_eq!(engine.stats().cached_documents, 0);
}

#[test]
fn test_shared_range_from_directory() {
    let dir = TempDir::new().unwrap();
    write_range(&dir, "Crotalus_atrox", -117.0, 22.0, -93.0, 38.0);
    write_range(&dir, "Crotalus_viridis", -114.0, 31.0, -96.0, 53.0);

    let engine = EngineBuilder::new().directory(dir.path()).build().unwrap();
    let keys = [
        SpeciesKey::from_normalized("Crotalus_atrox"),
        SpeciesKey::from_normalized("Crotalus_viridis"),
    ];
    let shared = engine.common_range(&keys).unwrap();
    let bbox = rangewatch::bbox_of(&geojson::GeoJson::Geometry(shared)).unwrap();
    let expected = [-114.0, 31.0, -96.0, 38.0];
    for (got, want) in bbox.to_array().iter().zip(expected) {
        assert!((got - want).abs() < 1e-9);
    }

    // No bbox table exists, so the per-species path filled the cache.
    assert!(engine.get_or_load(&keys[0]).is_some());
    assert_eq!(engine.stats().cached_documents, 2);
}

#[test]
fn test_missing_directory_degrades_to_none() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let engine = EngineBuilder::new()
        .directory(dir.path().join("absent"))
        .build()
        .unwrap();

    let key = SpeciesKey::from_normalized("Crotalus_atrox");
    assert!(engine.get_or_load(&key).is_none());
    assert!(engine.common_range(&[key.clone(), key]).is_none());
}
