//! Geographic coordinates and great-circle helpers.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// A position on the globe.
///
/// Longitude and latitude are stored in radians, altitude in metres. All
/// spherical helpers work on the unit sphere, so distances are angles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in radians.
    pub lon: f64,
    /// Latitude in radians.
    pub lat: f64,
    /// Altitude in metres.
    #[serde(default)]
    pub altitude: f64,
}

impl Coordinate {
    /// Create a coordinate from radians.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            altitude: 0.0,
        }
    }

    /// Create a coordinate from degrees.
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self::new(lon.to_radians(), lat.to_radians())
    }

    /// Set the altitude.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// Longitude in degrees.
    pub fn lon_degrees(&self) -> f64 {
        self.lon.to_degrees()
    }

    /// Latitude in degrees.
    pub fn lat_degrees(&self) -> f64 {
        self.lat.to_degrees()
    }

    /// Initial great-circle bearing from `self` towards `other`, in radians
    /// clockwise from north.
    pub fn bearing(&self, other: &Coordinate) -> f64 {
        let dlon = other.lon - self.lon;
        let y = dlon.sin() * other.lat.cos();
        let x = self.lat.cos() * other.lat.sin() - self.lat.sin() * other.lat.cos() * dlon.cos();
        y.atan2(x)
    }

    /// Angular great-circle distance to `other` (haversine).
    pub fn distance(&self, other: &Coordinate) -> f64 {
        let dlat = (other.lat - self.lat) / 2.0;
        let dlon = (other.lon - self.lon) / 2.0;
        let h = dlat.sin().powi(2) + self.lat.cos() * other.lat.cos() * dlon.sin().powi(2);
        2.0 * h.sqrt().min(1.0).asin()
    }

    /// Travel `distance` (radians) along the great circle leaving `self` at
    /// `bearing`. The result is not normalized.
    pub fn move_by_bearing(&self, bearing: f64, distance: f64) -> Coordinate {
        if distance.abs() < f64::EPSILON {
            return *self;
        }

        let lat = (self.lat.sin() * distance.cos()
            + self.lat.cos() * distance.sin() * bearing.cos())
        .clamp(-1.0, 1.0)
        .asin();
        let lon = self.lon
            + (bearing.sin() * distance.sin() * self.lat.cos())
                .atan2(distance.cos() - self.lat.sin() * lat.sin());

        Coordinate {
            lon,
            lat,
            altitude: self.altitude,
        }
    }

    /// Copy with longitude and latitude wrapped into their valid ranges.
    pub fn normalized(&self) -> Coordinate {
        let (lon, lat) = normalize_lon_lat(self.lon, self.lat);
        Coordinate {
            lon,
            lat,
            altitude: self.altitude,
        }
    }

    /// Spherical linear interpolation towards `other`; `t = 0.5` gives the
    /// great-circle midpoint.
    pub fn interpolate(&self, other: &Coordinate, t: f64) -> Coordinate {
        let a = self.to_unit_vector();
        let b = other.to_unit_vector();
        let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
        let omega = dot.acos();
        let altitude = self.altitude + (other.altitude - self.altitude) * t;

        let (k0, k1) = if omega.sin().abs() < 1e-12 {
            // Coincident or antipodal: no unique great circle, fall back to a chord.
            (1.0 - t, t)
        } else {
            let s = omega.sin();
            (((1.0 - t) * omega).sin() / s, (t * omega).sin() / s)
        };

        let v = [
            a[0] * k0 + b[0] * k1,
            a[1] * k0 + b[1] * k1,
            a[2] * k0 + b[2] * k1,
        ];
        if v[0].abs() < 1e-15 && v[1].abs() < 1e-15 && v[2].abs() < 1e-15 {
            return *self;
        }

        Coordinate {
            lon: v[1].atan2(v[0]),
            lat: v[2].atan2(v[0].hypot(v[1])),
            altitude,
        }
    }

    /// Compare longitude and latitude within `epsilon` radians.
    pub fn approx_eq(&self, other: &Coordinate, epsilon: f64) -> bool {
        (self.lon - other.lon).abs() <= epsilon && (self.lat - other.lat).abs() <= epsilon
    }

    fn to_unit_vector(self) -> [f64; 3] {
        [
            self.lat.cos() * self.lon.cos(),
            self.lat.cos() * self.lon.sin(),
            self.lat.sin(),
        ]
    }
}

/// Wrap a longitude/latitude pair (radians) so that latitude lies in
/// `[-pi/2, pi/2]` and longitude in `[-pi, pi)`.
///
/// Latitudes past a pole continue on the far side of the globe, which flips
/// the longitude by half a turn.
pub fn normalize_lon_lat(lon: f64, lat: f64) -> (f64, f64) {
    let mut lon = lon;
    let mut lat = wrap_pi(lat);

    if lat > FRAC_PI_2 {
        lat = PI - lat;
        lon += PI;
    } else if lat < -FRAC_PI_2 {
        lat = -PI - lat;
        lon += PI;
    }

    (wrap_pi(lon), lat)
}

fn wrap_pi(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}
