//! Rings, line strings and polygons.

use super::Coordinate;
use serde::{Deserialize, Serialize};

/// Minimum number of nodes an editable ring or line keeps.
pub const MIN_NODES: usize = 3;

/// A closed sequence of coordinates (the outer boundary or a hole).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ring {
    pub points: Vec<Coordinate>,
}

impl Ring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A ring with fewer than three points cannot bound anything.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < MIN_NODES
    }

    /// Even-odd crossing test on (longitude, latitude).
    pub fn contains(&self, coord: &Coordinate) -> bool {
        ring_contains(&self.points, coord)
    }
}

impl From<Vec<Coordinate>> for Ring {
    fn from(points: Vec<Coordinate>) -> Self {
        Self { points }
    }
}

/// An ordered polyline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineString {
    pub points: Vec<Coordinate>,
    /// Whether the last point connects back to the first.
    #[serde(default)]
    pub closed: bool,
}

impl LineString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Coordinate>> for LineString {
    fn from(points: Vec<Coordinate>) -> Self {
        Self {
            points,
            closed: false,
        }
    }
}

/// A polygon: one outer ring and any number of holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub outer: Ring,
    #[serde(default)]
    pub inner: Vec<Ring>,
}

impl Polygon {
    pub fn new(outer: Ring) -> Self {
        Self {
            outer,
            inner: Vec::new(),
        }
    }

    /// Add a hole.
    pub fn with_hole(mut self, hole: Ring) -> Self {
        self.inner.push(hole);
        self
    }

    /// Every point of every hole lies within the outer ring.
    pub fn is_valid(&self) -> bool {
        holes_within(
            &self.outer.points,
            self.inner.iter().map(|ring| ring.points.as_slice()),
        )
    }

    /// Total node count over the outer ring and all holes.
    pub fn node_count(&self) -> usize {
        self.outer.len() + self.inner.iter().map(Ring::len).sum::<usize>()
    }
}

/// Point-in-ring test on raw coordinates (ray casting in lon/lat space).
pub fn ring_contains(points: &[Coordinate], coord: &Coordinate) -> bool {
    if points.len() < MIN_NODES {
        return false;
    }
    even_odd_contains(points, (coord.lon, coord.lat), |c| (c.lon, c.lat))
}

/// Even-odd crossing test of `point` against the closed ring `vertices`,
/// each projected to planar `(x, y)` by `xy`.
pub(crate) fn even_odd_contains<T>(
    vertices: &[T],
    point: (f64, f64),
    xy: impl Fn(&T) -> (f64, f64),
) -> bool {
    let Some(last) = vertices.last() else {
        return false;
    };
    let (px, py) = point;
    let mut inside = false;
    let (mut xj, mut yj) = xy(last);
    for vertex in vertices {
        let (xi, yi) = xy(vertex);
        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        (xj, yj) = (xi, yi);
    }
    inside
}

/// Check that every hole point lies inside `outer`.
pub fn holes_within<'a>(
    outer: &[Coordinate],
    mut holes: impl Iterator<Item = &'a [Coordinate]>,
) -> bool {
    holes.all(|hole| hole.iter().all(|point| ring_contains(outer, point)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Ring {
        Ring::from(vec![
            Coordinate::from_degrees(min, min),
            Coordinate::from_degrees(max, min),
            Coordinate::from_degrees(max, max),
            Coordinate::from_degrees(min, max),
        ])
    }

    #[test]
    fn test_ring_contains() {
        let ring = square(0.0, 10.0);
        assert!(ring.contains(&Coordinate::from_degrees(5.0, 5.0)));
        assert!(!ring.contains(&Coordinate::from_degrees(15.0, 5.0)));
        assert!(!ring.contains(&Coordinate::from_degrees(-1.0, -1.0)));
    }

    #[test]
    fn test_even_odd_on_concave_ring() {
        // U shape opening upwards.
        let u = [
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ];
        let xy = |p: &(f64, f64)| *p;
        assert!(even_odd_contains(&u, (0.5, 2.0), xy));
        assert!(even_odd_contains(&u, (2.5, 2.0), xy));
        assert!(!even_odd_contains(&u, (1.5, 2.0), xy));
        assert!(even_odd_contains(&u, (1.5, 0.5), xy));
        assert!(!even_odd_contains::<(f64, f64)>(&[], (0.0, 0.0), xy));
    }

    #[test]
    fn test_degenerate_ring_contains_nothing() {
        let ring = Ring::from(vec![
            Coordinate::from_degrees(0.0, 0.0),
            Coordinate::from_degrees(10.0, 10.0),
        ]);
        assert!(ring.is_degenerate());
        assert!(!ring.contains(&Coordinate::from_degrees(5.0, 5.0)));
    }

    #[test]
    fn test_polygon_validity() {
        let valid = Polygon::new(square(0.0, 10.0)).with_hole(square(2.0, 4.0));
        assert!(valid.is_valid());

        let invalid = Polygon::new(square(0.0, 10.0)).with_hole(square(8.0, 12.0));
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_polygon_without_holes_is_valid() {
        assert!(Polygon::new(square(0.0, 1.0)).is_valid());
    }

    #[test]
    fn test_node_count() {
        let poly = Polygon::new(square(0.0, 10.0)).with_hole(square(2.0, 4.0));
        assert_eq!(poly.node_count(), 8);
    }

    #[test]
    fn test_polygon_serde_roundtrip() {
        let poly = Polygon::new(square(0.0, 10.0)).with_hole(square(2.0, 4.0));
        let json = serde_json::to_string(&poly).unwrap();
        let back: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(poly, back);
    }
}
