use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned bounding box in lon/lat.
///
/// Wraps `geo::Rect`, so the corners are always normalised: `min_x <= max_x`
/// and `min_y <= max_y` hold for every value of this type. Serialises as the
/// flat array `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// The underlying geometric rectangle
    pub rect: Rect,
}

impl BoundingBox {
    /// Create a new bounding box from minimum and maximum coordinates.
    ///
    /// # Arguments
    ///
    /// * `min_x` - Minimum longitude
    /// * `min_y` - Minimum latitude
    /// * `max_x` - Maximum longitude
    /// * `max_y` - Maximum latitude
    ///
    /// Swapped corners are reordered rather than rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use rangewatch_types::bbox::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(-125.0, 24.0, -66.0, 49.0);
    /// assert_eq!(bbox.width(), 59.0);
    /// ```
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: min_x, y: min_y },
                geo::coord! { x: max_x, y: max_y },
            ),
        }
    }

    /// Create a bounding box from a `geo::Rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self { rect }
    }

    /// A zero-size box covering a single coordinate.
    pub fn from_coord(coord: Coord) -> Self {
        Self {
            rect: Rect::new(coord, coord),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.rect.min().x
    }

    pub fn min_y(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_x(&self) -> f64 {
        self.rect.max().x
    }

    pub fn max_y(&self) -> f64 {
        self.rect.max().y
    }

    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    /// Planar area in square degrees.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Coord {
        self.rect.center()
    }

    /// Check if a lon/lat position lies inside the box, edges included.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_x() && lon <= self.max_x() && lat >= self.min_y() && lat <= self.max_y()
    }

    /// Check if this bounding box intersects with another.
    ///
    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(other.min_x() > self.max_x()
            || other.max_x() < self.min_x()
            || other.min_y() > self.max_y()
            || other.max_y() < self.min_y())
    }

    /// The clamped intersection rectangle, or `None` when it has no interior.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min_x = self.min_x().max(other.min_x());
        let min_y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());

        if min_x >= max_x || min_y >= max_y {
            return None;
        }
        Some(BoundingBox::new(min_x, min_y, max_x, max_y))
    }

    /// Area of the clamped intersection rectangle; `0.0` if it is degenerate.
    ///
    /// ```
    /// use rangewatch_types::bbox::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    /// let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
    /// assert_eq!(a.overlap_area(&b), 25.0);
    /// ```
    pub fn overlap_area(&self, other: &BoundingBox) -> f64 {
        self.intersection(other).map_or(0.0, |b| b.area())
    }

    /// Grow the box so it also covers `coord`.
    pub fn extend(&mut self, coord: Coord) {
        let min = geo::coord! {
            x: self.min_x().min(coord.x),
            y: self.min_y().min(coord.y),
        };
        let max = geo::coord! {
            x: self.max_x().max(coord.x),
            y: self.max_y().max(coord.y),
        };
        self.rect = Rect::new(min, max);
    }

    /// Smallest box covering both inputs.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut merged = *self;
        merged.extend(other.rect.min());
        merged.extend(other.rect.max());
        merged
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x(), self.min_y(), self.max_x(), self.max_y()]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        BoundingBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        b.to_array()
    }
}
