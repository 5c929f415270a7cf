//! Geographic geometry: coordinates, rings, line strings and polygons.

mod coordinate;
mod ring;

pub use coordinate::{Coordinate, normalize_lon_lat};
pub use ring::{LineString, MIN_NODES, Polygon, Ring, holes_within, ring_contains};

pub(crate) use ring::even_odd_contains;
