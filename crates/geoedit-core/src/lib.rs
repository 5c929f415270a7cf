//! GeoEdit Core Library
//!
//! Interactive node editing of polygons and polylines drawn over a map:
//! per-shape state machines, screen-space hit regions and the geographic
//! geometry they edit.

pub mod config;
pub mod editor;
pub mod error;
pub mod geo;
pub mod input;
pub mod node;
pub mod region;
pub mod viewport;

pub use config::{EditorConfig, NodePalette, SerializableColor};
pub use editor::{
    ActionState, AnimationStatus, AreaEditor, DeleteOutcome, EditableShape, Geometry,
    MergeAnimation, NodeRef, PolylineEditor, Request, ShapeId, ShapeItem, ShapeKind, StateChange,
};
pub use error::{EditError, EditResult};
pub use geo::{Coordinate, LineString, Polygon, Ring};
pub use input::{MouseButton, PointerEvent, PressTracker};
pub use node::{Node, NodeAppearance, NodeFlags, NodeSeq, VirtualNode};
pub use region::{Region, RegionBuilder};
pub use viewport::{MapViewport, Viewport};
