//! Screen <-> geographic conversion.

use crate::geo::Coordinate;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default scale, in screen pixels per degree.
pub const DEFAULT_ZOOM: f64 = 10.0;

/// Converts between screen positions and geographic coordinates.
///
/// Conversions may fail (`None`) for points off the globe or behind the
/// visible hemisphere, depending on the projection.
pub trait Viewport {
    /// Geographic position under a screen point.
    fn screen_to_geographic(&self, point: Point) -> Option<Coordinate>;

    /// Screen position of a geographic coordinate.
    fn geographic_to_screen(&self, coord: &Coordinate) -> Option<Point>;
}

/// A flat (equirectangular) map view with pan and zoom.
///
/// `offset` is the screen position of longitude 0, latitude 0 and `zoom` the
/// number of pixels per degree. Screen y grows downwards, latitude upwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapViewport {
    /// Screen position of the (0, 0) coordinate.
    pub offset: Vec2,
    /// Pixels per degree.
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: DEFAULT_ZOOM,
            min_zoom: 0.5,
            max_zoom: 1.0e6,
        }
    }
}

impl MapViewport {
    pub fn new(offset: Vec2, zoom: f64) -> Self {
        Self {
            offset,
            zoom,
            ..Self::default()
        }
    }

    /// Transform from (lon, lat) degrees to screen pixels.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale_non_uniform(self.zoom, -self.zoom)
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the coordinate under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let degrees = self.transform().inverse() * screen_point;
        self.zoom = new_zoom;
        let moved = self.transform() * degrees;
        self.offset += screen_point - moved;
    }

    /// Center the view on `coords`, scaled to fit `viewport` minus `padding`.
    pub fn fit_to(&mut self, coords: &[Coordinate], viewport: Size, padding: f64) {
        let Some(first) = coords.first() else {
            return;
        };

        let (mut min_x, mut min_y) = (first.lon_degrees(), first.lat_degrees());
        let (mut max_x, mut max_y) = (min_x, min_y);
        for c in coords {
            min_x = min_x.min(c.lon_degrees());
            max_x = max_x.max(c.lon_degrees());
            min_y = min_y.min(c.lat_degrees());
            max_y = max_y.max(c.lat_degrees());
        }

        let width = (max_x - min_x).max(f64::EPSILON);
        let height = (max_y - min_y).max(f64::EPSILON);
        let usable = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        self.zoom = (usable.width / width)
            .min(usable.height / height)
            .clamp(self.min_zoom, self.max_zoom);

        let center = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        self.offset = Vec2::new(
            viewport.width / 2.0 - center.x * self.zoom,
            viewport.height / 2.0 + center.y * self.zoom,
        );
    }
}

impl Viewport for MapViewport {
    fn screen_to_geographic(&self, point: Point) -> Option<Coordinate> {
        let degrees = self.transform().inverse() * point;
        if degrees.y.abs() > 90.0 {
            return None;
        }
        Some(Coordinate::from_degrees(degrees.x, degrees.y))
    }

    fn geographic_to_screen(&self, coord: &Coordinate) -> Option<Point> {
        Some(self.transform() * Point::new(coord.lon_degrees(), coord.lat_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_offset() {
        let view = MapViewport::new(Vec2::new(400.0, 300.0), 100.0);
        let p = view
            .geographic_to_screen(&Coordinate::from_degrees(0.0, 0.0))
            .unwrap();
        assert!((p.x - 400.0).abs() < 1e-9);
        assert!((p.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_latitude_grows_upwards() {
        let view = MapViewport::new(Vec2::new(400.0, 300.0), 100.0);
        let p = view
            .geographic_to_screen(&Coordinate::from_degrees(1.0, 1.0))
            .unwrap();
        assert!((p.x - 500.0).abs() < 1e-9);
        assert!((p.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let view = MapViewport::new(Vec2::new(30.0, -20.0), 7.5);
        let screen = Point::new(123.0, 456.0);
        let coord = view.screen_to_geographic(screen).unwrap();
        let back = view.geographic_to_screen(&coord).unwrap();
        assert!((back.x - screen.x).abs() < 1e-9);
        assert!((back.y - screen.y).abs() < 1e-9);
    }

    #[test]
    fn test_off_globe_is_none() {
        let view = MapViewport::new(Vec2::ZERO, 1.0);
        assert!(view.screen_to_geographic(Point::new(0.0, -100.0)).is_none());
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut view = MapViewport::new(Vec2::new(100.0, 100.0), 10.0);
        let anchor = Point::new(250.0, 80.0);
        let before = view.screen_to_geographic(anchor).unwrap();
        view.zoom_at(anchor, 2.0);
        let after = view.screen_to_geographic(anchor).unwrap();
        assert!(before.approx_eq(&after, 1e-12));
        assert!((view.zoom - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut view = MapViewport::default();
        view.zoom_at(Point::ZERO, 1.0e-9);
        assert!((view.zoom - view.min_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan() {
        let mut view = MapViewport::default();
        view.pan(Vec2::new(10.0, 20.0));
        assert!((view.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((view.offset.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_centers_coordinates() {
        let mut view = MapViewport::default();
        let coords = [
            Coordinate::from_degrees(10.0, 10.0),
            Coordinate::from_degrees(20.0, 30.0),
        ];
        view.fit_to(&coords, Size::new(800.0, 600.0), 0.0);
        let center = view
            .geographic_to_screen(&Coordinate::from_degrees(15.0, 20.0))
            .unwrap();
        assert!((center.x - 400.0).abs() < 1e-6);
        assert!((center.y - 300.0).abs() < 1e-6);
    }
}
