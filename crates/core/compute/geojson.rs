//! Lenient GeoJSON loading for range documents and conversion to `geo` polygons.

use crate::compute::validation::validate_ring;
use crate::error::{RangeError, Result};
use geo::{LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde_json::Value as JsonValue;

const GEOMETRY_TAGS: [&str; 7] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// Parses a range document without failing on malformed members.
///
/// - Collection members that do not parse as features are dropped.
/// - A feature whose geometry is missing, `null` or malformed keeps no geometry.
/// - Unknown `type` tags and non-object input yield `None`.
pub fn parse_range_document(value: JsonValue) -> Option<GeoJson> {
    let JsonValue::Object(mut object) = value else {
        return None;
    };
    let kind = object.get("type").and_then(JsonValue::as_str)?.to_string();

    match kind.as_str() {
        "FeatureCollection" => {
            let members = match object.remove("features") {
                Some(JsonValue::Array(items)) => items,
                _ => Vec::new(),
            };
            let features = members.into_iter().filter_map(parse_feature).collect();
            Some(GeoJson::FeatureCollection(FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            }))
        }
        "Feature" => parse_feature(JsonValue::Object(object)).map(GeoJson::Feature),
        tag if GEOMETRY_TAGS.contains(&tag) => parse_geometry(JsonValue::Object(object))
            .map(GeoJson::Geometry),
        other => {
            log::trace!("Ignoring range document with unknown type tag {:?}", other);
            None
        }
    }
}

/// Parses a GeoJSON string through [`parse_range_document`].
pub fn parse_range_str(json: &str) -> Result<Option<GeoJson>> {
    let value: JsonValue = serde_json::from_str(json)?;
    Ok(parse_range_document(value))
}

fn parse_feature(value: JsonValue) -> Option<Feature> {
    let JsonValue::Object(mut object) = value else {
        return None;
    };
    if object.get("type").and_then(JsonValue::as_str) != Some("Feature") {
        return None;
    }

    let geometry = object.remove("geometry").and_then(parse_geometry);
    let properties = match object.remove("properties") {
        Some(JsonValue::Object(props)) => Some(props),
        _ => None,
    };

    Some(Feature {
        bbox: None,
        geometry,
        id: None,
        properties,
        foreign_members: None,
    })
}

/// Parses one geometry after dropping unusable positions.
///
/// Collection members are parsed one by one, so a bad member is skipped
/// without losing its siblings.
fn parse_geometry(value: JsonValue) -> Option<Geometry> {
    let JsonValue::Object(mut object) = value else {
        return None;
    };

    if object.get("type").and_then(JsonValue::as_str) == Some("GeometryCollection") {
        let members = match object.remove("geometries") {
            Some(JsonValue::Array(items)) => items,
            _ => Vec::new(),
        };
        let members = members.into_iter().filter_map(parse_geometry).collect();
        return Some(Geometry::new(Value::GeometryCollection(members)));
    }

    if let Some(coordinates) = object.get_mut("coordinates")
        && !clean_coordinates(coordinates)
    {
        log::trace!("Skipping geometry without usable coordinates");
        return None;
    }

    match serde_json::from_value::<Geometry>(JsonValue::Object(object)) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            log::trace!("Skipping malformed geometry: {}", e);
            None
        }
    }
}

/// Strips positions that do not start with two numbers, at any depth.
///
/// Returns `false` when the coordinates are not an array, or are a single
/// position that cannot be kept. An empty array is kept as-is.
fn clean_coordinates(value: &mut JsonValue) -> bool {
    match value {
        JsonValue::Array(items) if items.is_empty() => true,
        JsonValue::Array(_) => keep_nested(value),
        _ => false,
    }
}

fn keep_nested(value: &mut JsonValue) -> bool {
    let JsonValue::Array(items) = value else {
        return false;
    };
    if items.iter().any(JsonValue::is_array) {
        items.retain_mut(keep_nested);
        return true;
    }
    // A position: keep the leading run of numbers, at least x and y.
    let numeric = items.iter().take_while(|v| v.is_number()).count();
    items.truncate(numeric);
    numeric >= 2
}

/// Builds a polygon from GeoJSON rings (exterior first).
pub fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon> {
    let Some((exterior, interiors)) = rings.split_first() else {
        return Err(RangeError::InvalidGeometry(
            "Polygon must have at least one ring".to_string(),
        ));
    };

    let exterior = LineString::from(validate_ring(exterior)?);
    let interiors = interiors
        .iter()
        .map(|ring| validate_ring(ring).map(LineString::from))
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}

/// Collects the polygonal parts of a geometry.
///
/// Geometry collections are flattened; points and lines contribute nothing.
pub fn polygons_of(geometry: &Geometry) -> Result<Vec<Polygon>> {
    let mut polygons = Vec::new();
    let mut stack = vec![geometry];

    while let Some(geometry) = stack.pop() {
        match &geometry.value {
            Value::Polygon(rings) => polygons.push(polygon_from_rings(rings)?),
            Value::MultiPolygon(parts) => {
                for rings in parts {
                    polygons.push(polygon_from_rings(rings)?);
                }
            }
            Value::GeometryCollection(members) => stack.extend(members.iter().rev()),
            _ => {}
        }
    }

    Ok(polygons)
}

/// Polygonal content of a range document, one multipolygon per feature.
///
/// A bare geometry counts as a single feature. Features without polygonal
/// content are omitted.
pub fn feature_parts(document: &GeoJson) -> Result<Vec<MultiPolygon>> {
    let geometries: Vec<&Geometry> = match document {
        GeoJson::Geometry(geometry) => vec![geometry],
        GeoJson::Feature(feature) => feature.geometry.iter().collect(),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .collect(),
    };

    let mut parts = Vec::with_capacity(geometries.len());
    for geometry in geometries {
        let polygons = polygons_of(geometry)?;
        if !polygons.is_empty() {
            parts.push(MultiPolygon::new(polygons));
        }
    }
    Ok(parts)
}

/// Converts a multipolygon into a GeoJSON geometry.
pub fn multi_polygon_to_geojson(multi: &MultiPolygon) -> Geometry {
    let ring_coords = |ring: &LineString| -> Vec<Vec<f64>> {
        ring.coords().map(|coord| vec![coord.x, coord.y]).collect()
    };

    let polygons = multi
        .iter()
        .map(|polygon| {
            let mut rings = vec![ring_coords(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring_coords));
            rings
        })
        .collect();

    Geometry::new(Value::MultiPolygon(polygons))
}
