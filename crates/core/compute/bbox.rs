//! Bounding boxes of range documents.

use geo::Coord;
use geojson::{GeoJson, Geometry, Value};
use rangewatch_types::{BoundingBox, SpeciesKey};
use std::collections::BTreeMap;

/// Tree nodes still to visit during [`bbox_of`].
enum Node<'a> {
    Feature(&'a geojson::Feature),
    Geometry(&'a Geometry),
}

/// Minimal envelope of every position in a document.
///
/// Walks FeatureCollection → Feature → Geometry → GeometryCollection with an
/// explicit stack. Positions shorter than two ordinates or with non-finite
/// values are skipped. Returns `None` when no usable position exists.
///
/// ```
/// use rangewatch::compute::bbox::bbox_of;
/// use geojson::GeoJson;
///
/// let doc: GeoJson = r#"{"type":"LineString","coordinates":[[-120,30],[-100,40]]}"#
///     .parse()
///     .unwrap();
/// let bbox = bbox_of(&doc).unwrap();
/// assert_eq!(bbox.to_array(), [-120.0, 30.0, -100.0, 40.0]);
/// ```
pub fn bbox_of(document: &GeoJson) -> Option<BoundingBox> {
    let mut stack: Vec<Node<'_>> = match document {
        GeoJson::Geometry(geometry) => vec![Node::Geometry(geometry)],
        GeoJson::Feature(feature) => vec![Node::Feature(feature)],
        GeoJson::FeatureCollection(collection) => {
            collection.features.iter().map(Node::Feature).collect()
        }
    };
    let mut acc: Option<BoundingBox> = None;

    while let Some(node) = stack.pop() {
        let geometry = match node {
            Node::Feature(feature) => match &feature.geometry {
                Some(geometry) => geometry,
                None => continue,
            },
            Node::Geometry(geometry) => geometry,
        };

        match &geometry.value {
            Value::Point(position) => fold_position(&mut acc, position),
            Value::MultiPoint(positions) | Value::LineString(positions) => {
                fold_positions(&mut acc, positions)
            }
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                for line in lines {
                    fold_positions(&mut acc, line);
                }
            }
            Value::MultiPolygon(polygons) => {
                for rings in polygons {
                    for ring in rings {
                        fold_positions(&mut acc, ring);
                    }
                }
            }
            Value::GeometryCollection(members) => {
                stack.extend(members.iter().map(Node::Geometry));
            }
        }
    }

    acc
}

fn fold_positions(acc: &mut Option<BoundingBox>, positions: &[Vec<f64>]) {
    for position in positions {
        fold_position(acc, position);
    }
}

fn fold_position(acc: &mut Option<BoundingBox>, position: &[f64]) {
    let [x, y, ..] = position else {
        return;
    };
    if !x.is_finite() || !y.is_finite() {
        return;
    }
    let coord = Coord { x: *x, y: *y };
    match acc {
        Some(bbox) => bbox.extend(coord),
        None => *acc = Some(BoundingBox::from_coord(coord)),
    }
}

/// Precomputes the bulk-preload table: species key → envelope.
///
/// Documents without coordinates are left out of the table.
pub fn bbox_table<I>(documents: I) -> BTreeMap<SpeciesKey, BoundingBox>
where
    I: IntoIterator<Item = (SpeciesKey, GeoJson)>,
{
    documents
        .into_iter()
        .filter_map(|(key, document)| bbox_of(&document).map(|bbox| (key, bbox)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::geojson::parse_range_document;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> GeoJson {
        parse_range_document(value).expect("valid document")
    }

    #[test]
    fn test_polygon_bbox_contains_every_coordinate() {
        let coords = [[-110.5, 31.0], [-104.0, 29.5], [-103.0, 37.0], [-109.0, 36.2]];
        let document = doc(json!({
            "type": "Polygon",
            "coordinates": [[coords[0], coords[1], coords[2], coords[3], coords[0]]]
        }));

        let bbox = bbox_of(&document).unwrap();
        assert!(bbox.min_x() <= bbox.max_x());
        assert!(bbox.min_y() <= bbox.max_y());
        for [x, y] in coords {
            assert!(bbox.contains(x, y));
        }
        assert_eq!(bbox.to_array(), [-110.5, 29.5, -103.0, 37.0]);
    }

    #[test]
    fn test_multipolygon_and_nested_collection() {
        let document = doc(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                            [[[5, 5], [6, 5], [6, 7], [5, 5]]]
                        ]
                    }
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "GeometryCollection",
                        "geometries": [
                            { "type": "GeometryCollection", "geometries": [
                                { "type": "Point", "coordinates": [-3, 2, 100] }
                            ]}
                        ]
                    }
                }
            ]
        }));

        assert_eq!(bbox_of(&document).unwrap().to_array(), [-3.0, 0.0, 6.0, 7.0]);
    }

    #[test]
    fn test_documents_without_coordinates() {
        let empty_collection = doc(json!({ "type": "FeatureCollection", "features": [] }));
        assert!(bbox_of(&empty_collection).is_none());

        let null_geometry = doc(json!({ "type": "Feature", "geometry": null }));
        assert!(bbox_of(&null_geometry).is_none());

        let no_geometry_key = doc(json!({ "type": "Feature", "properties": {} }));
        assert!(bbox_of(&no_geometry_key).is_none());

        let empty_polygon = doc(json!({ "type": "Polygon", "coordinates": [] }));
        assert!(bbox_of(&empty_polygon).is_none());

        let empty_gc = doc(json!({ "type": "GeometryCollection", "geometries": [] }));
        assert!(bbox_of(&empty_gc).is_none());
    }

    #[test]
    fn test_short_positions_are_skipped() {
        let document = doc(json!({
            "type": "LineString",
            "coordinates": [[1.0], [2.0, 3.0], []]
        }));
        let bbox = bbox_of(&document).unwrap();
        assert_eq!(bbox.to_array(), [2.0, 3.0, 2.0, 3.0]);
    }

    #[test]
    fn test_non_numeric_ordinates_contribute_nothing() {
        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[0, 0], [10, 0], [10, 10], [null, 5], [0, 0]]]
        });
        let bare = doc(polygon.clone());
        assert_eq!(bbox_of(&bare).unwrap().to_array(), [0.0, 0.0, 10.0, 10.0]);

        let feature = doc(json!({ "type": "Feature", "properties": {}, "geometry": polygon }));
        assert_eq!(bbox_of(&feature).unwrap().to_array(), [0.0, 0.0, 10.0, 10.0]);

        let strings = doc(json!({
            "type": "MultiPoint",
            "coordinates": [["-120", "30"], [-100, 40], [-90]]
        }));
        assert_eq!(bbox_of(&strings).unwrap().to_array(), [-100.0, 40.0, -100.0, 40.0]);
    }

    #[test]
    fn test_bbox_table_omits_empty_documents() {
        let a = SpeciesKey::from_normalized("A");
        let b = SpeciesKey::from_normalized("B");
        let table = bbox_table(vec![
            (
                a.clone(),
                doc(json!({ "type": "Point", "coordinates": [1.0, 2.0] })),
            ),
            (b, doc(json!({ "type": "FeatureCollection", "features": [] }))),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table[&a].to_array(), [1.0, 2.0, 1.0, 2.0]);
    }
}
