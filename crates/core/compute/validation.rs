//! Validation for geographic coordinates and polygon rings.

use crate::error::{RangeError, Result};
use geo::Coord;

/// Validates a lon/lat pair.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use rangewatch::compute::validation::validate_geographic_point;
///
/// assert!(validate_geographic_point(-110.0, 32.0).is_ok());
/// assert!(validate_geographic_point(200.0, 40.0).is_err());
/// assert!(validate_geographic_point(-74.0, 95.0).is_err());
/// ```
pub fn validate_geographic_point(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite() {
        return Err(RangeError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lon
        )));
    }

    if !lat.is_finite() {
        return Err(RangeError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(RangeError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lon
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(RangeError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    Ok(())
}

/// Converts a GeoJSON position into a coordinate.
///
/// Extra ordinates (altitude, measure) are ignored.
pub fn validate_position(position: &[f64]) -> Result<Coord> {
    if position.len() < 2 {
        return Err(RangeError::InvalidGeometry(
            "Coordinate must have at least 2 values".to_string(),
        ));
    }
    let (x, y) = (position[0], position[1]);
    if !x.is_finite() || !y.is_finite() {
        return Err(RangeError::InvalidGeometry(format!(
            "Coordinate must be finite, got: [{}, {}]",
            x, y
        )));
    }
    Ok(Coord { x, y })
}

/// Validates a linear ring: at least four finite positions.
///
/// Open rings are accepted; `geo` closes them on construction.
pub fn validate_ring(ring: &[Vec<f64>]) -> Result<Vec<Coord>> {
    if ring.len() < 4 {
        return Err(RangeError::InvalidGeometry(format!(
            "Ring must have at least 4 positions, got: {}",
            ring.len()
        )));
    }
    ring.iter()
        .enumerate()
        .map(|(idx, position)| {
            validate_position(position).map_err(|e| {
                RangeError::InvalidGeometry(format!("Ring position at index {}: {}", idx, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_geographic_point() {
        assert!(validate_geographic_point(-110.0, 32.0).is_ok());
        assert!(validate_geographic_point(180.0, 0.0).is_ok());
        assert!(validate_geographic_point(-180.0, 0.0).is_ok());
        assert!(validate_geographic_point(0.0, 90.0).is_ok());
        assert!(validate_geographic_point(0.0, -90.0).is_ok());
    }

    #[test]
    fn test_invalid_geographic_point() {
        assert!(validate_geographic_point(180.1, 40.0).is_err());
        assert!(validate_geographic_point(-74.0, 90.1).is_err());
        assert!(validate_geographic_point(-110.0, 95.0).is_err());
    }

    #[test]
    fn test_non_finite_coordinates() {
        assert!(validate_geographic_point(f64::NAN, 40.0).is_err());
        assert!(validate_geographic_point(-74.0, f64::NAN).is_err());
        assert!(validate_geographic_point(f64::INFINITY, 40.0).is_err());
        assert!(validate_geographic_point(-74.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_position() {
        assert_eq!(
            validate_position(&[1.0, 2.0, 300.0]).unwrap(),
            Coord { x: 1.0, y: 2.0 }
        );
        assert!(validate_position(&[1.0]).is_err());
        assert!(validate_position(&[f64::NAN, 2.0]).is_err());
    }

    #[test]
    fn test_validate_ring() {
        let square = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ];
        assert_eq!(validate_ring(&square).unwrap().len(), 4);

        let short = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 0.0]];
        assert!(validate_ring(&short).is_err());

        let bad = vec![vec![0.0, 0.0], vec![1.0], vec![1.0, 1.0], vec![0.0, 0.0]];
        assert!(validate_ring(&bad).is_err());
    }
}
