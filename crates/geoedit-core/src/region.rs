//! Screen-space hit regions.

use crate::geo::{Coordinate, even_odd_contains};
use crate::viewport::{MapViewport, Viewport};
use kurbo::{Ellipse, Point, Shape, Vec2};

/// A clickable area in screen pixels.
///
/// Regions are only ever used for hit testing; no geometry is computed from
/// them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Region {
    /// Contains nothing (e.g. the source coordinate is not visible).
    #[default]
    Empty,
    /// Axis-aligned ellipse around a node.
    Ellipse { center: Point, radii: Vec2 },
    /// Filled polygon, even-odd rule.
    Polygon(Vec<Point>),
    /// Band of `half_width` pixels around a polyline.
    Polyline { points: Vec<Point>, half_width: f64 },
}

impl Region {
    pub fn ellipse(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Region::Ellipse {
            center,
            radii: Vec2::new(radius_x, radius_y),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Region::Empty => true,
            Region::Ellipse { radii, .. } => radii.x <= 0.0 || radii.y <= 0.0,
            Region::Polygon(points) => points.len() < 3,
            Region::Polyline { points, .. } => points.is_empty(),
        }
    }

    /// Check if a screen point lies inside the region.
    pub fn contains(&self, point: Point) -> bool {
        if self.is_empty() {
            return false;
        }

        match self {
            Region::Empty => false,
            Region::Ellipse { center, radii } => Ellipse::new(*center, *radii, 0.0).contains(point),
            Region::Polygon(points) => {
                even_odd_contains(points, (point.x, point.y), |p| (p.x, p.y))
            }
            Region::Polyline { points, half_width } => {
                if points.len() == 1 {
                    return points[0].distance(point) <= *half_width;
                }
                point_to_polyline_dist(point, points) <= *half_width
            }
        }
    }
}

/// Distance from a point to a line segment (a->b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Builds hit regions from geographic input.
///
/// The provided methods project through the [`Viewport`] supertrait;
/// projections that can do better (e.g. tessellating great circles) override
/// them. Coordinates that cannot be projected are skipped.
pub trait RegionBuilder: Viewport {
    fn ellipse_region(&self, coord: &Coordinate, radius_x: f64, radius_y: f64) -> Region {
        match self.geographic_to_screen(coord) {
            Some(center) => Region::ellipse(center, radius_x, radius_y),
            None => Region::Empty,
        }
    }

    fn polygon_region(&self, ring: &[Coordinate]) -> Region {
        let points: Vec<Point> = ring
            .iter()
            .filter_map(|c| self.geographic_to_screen(c))
            .collect();
        if points.len() < 3 {
            return Region::Empty;
        }
        Region::Polygon(points)
    }

    fn polyline_region(&self, line: &[Coordinate], width: f64) -> Region {
        let points: Vec<Point> = line
            .iter()
            .filter_map(|c| self.geographic_to_screen(c))
            .collect();
        if points.is_empty() {
            return Region::Empty;
        }
        Region::Polyline {
            points,
            half_width: width / 2.0,
        }
    }
}

impl RegionBuilder for MapViewport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipse_contains() {
        let region = Region::ellipse(Point::new(10.0, 10.0), 5.0, 5.0);
        assert!(region.contains(Point::new(12.0, 12.0)));
        assert!(!region.contains(Point::new(20.0, 10.0)));
    }

    #[test]
    fn test_empty_region_contains_nothing() {
        assert!(!Region::Empty.contains(Point::ZERO));
        assert!(!Region::ellipse(Point::ZERO, 0.0, 0.0).contains(Point::ZERO));
    }

    #[test]
    fn test_polygon_region_even_odd() {
        let region = Region::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        assert!(region.contains(Point::new(50.0, 50.0)));
        assert!(!region.contains(Point::new(150.0, 50.0)));
    }

    #[test]
    fn test_polyline_region_buffer() {
        let region = Region::Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            half_width: 2.5,
        };
        assert!(region.contains(Point::new(50.0, 2.0)));
        assert!(!region.contains(Point::new(50.0, 4.0)));
    }

    #[test]
    fn test_point_to_segment_dist() {
        let d = point_to_segment_dist(
            Point::new(50.0, 10.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((d - 10.0).abs() < 1e-12);
        let beyond = point_to_segment_dist(
            Point::new(110.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((beyond - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_builder_projects_through_viewport() {
        let view = MapViewport::new(Vec2::new(0.0, 0.0), 100.0);
        let region = view.ellipse_region(&Coordinate::from_degrees(1.0, -1.0), 5.0, 5.0);
        assert!(region.contains(Point::new(100.0, 100.0)));

        let square = [
            Coordinate::from_degrees(0.0, 0.0),
            Coordinate::from_degrees(1.0, 0.0),
            Coordinate::from_degrees(1.0, 1.0),
            Coordinate::from_degrees(0.0, 1.0),
        ];
        let poly = view.polygon_region(&square);
        assert!(poly.contains(Point::new(50.0, -50.0)));
        assert!(!poly.contains(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_degenerate_polygon_region_is_empty() {
        let view = MapViewport::default();
        let region = view.polygon_region(&[Coordinate::default(), Coordinate::default()]);
        assert!(region.is_empty());
    }
}
