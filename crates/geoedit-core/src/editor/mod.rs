//! Per-shape editing state machines.
//!
//! An item receives pointer events from the host, routes them through the
//! handler table of its current state and keeps geometry, node flags and hit
//! regions in step. Items never talk to each other; the host coordinates them
//! through [`StateChange`] notifications and [`Request`]s.

mod animation;
mod area;
mod dispatch;
mod polyline;
mod state;

pub use animation::MergeAnimation;
pub use area::{AreaEditor, NodeRef};
pub use polyline::PolylineEditor;
pub use state::{
    ActionState, AnimationStatus, AreaState, DeleteOutcome, PolylineState, Request, ShapeId,
    StateChange,
};

use crate::error::EditResult;
use crate::geo::{LineString, Polygon};
use crate::input::PointerEvent;
use crate::region::RegionBuilder;
use kurbo::Point;

/// Common protocol of every editable shape.
///
/// Operations that mutate geometry take the region builder so regions are
/// regenerated as part of the mutation.
pub trait EditableShape {
    fn id(&self) -> ShapeId;

    fn state(&self) -> ActionState;

    /// A merge animation is running; events and state changes are refused.
    fn is_busy(&self) -> bool;

    /// Route a pointer event to the current state's handler. Returns whether
    /// the event was consumed.
    fn handle_event(&mut self, event: &PointerEvent, view: &dyn RegionBuilder) -> bool;

    /// The point lies in a region that is active for the current state.
    fn contains_point(&self, point: Point) -> bool;

    /// Leave the current state and enter `state`. `Ok(None)` when the state
    /// did not change.
    fn set_state(
        &mut self,
        state: ActionState,
        view: &dyn RegionBuilder,
    ) -> EditResult<Option<StateChange>>;

    /// Pointer focus moved to another item.
    fn notify_other_item_changed(&mut self, view: &dyn RegionBuilder);

    /// Rebuild every hit region for the current viewport.
    fn refresh_regions(&mut self, view: &dyn RegionBuilder);

    fn request(&self) -> Option<Request>;

    fn take_request(&mut self) -> Option<Request>;

    fn delete_selected_nodes(&mut self, view: &dyn RegionBuilder) -> EditResult<DeleteOutcome>;

    /// Delete the node the last context menu was opened on.
    fn delete_clicked_node(&mut self, view: &dyn RegionBuilder) -> EditResult<DeleteOutcome>;

    /// Flip the selection of the context-menu node; returns the new value.
    fn toggle_clicked_node_selection(&mut self) -> EditResult<bool>;

    fn clicked_node_is_selected(&self) -> Option<bool>;

    fn has_nodes_selected(&self) -> bool;
}

/// Kind of shape an item edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Area,
    Polyline,
}

/// Geometry owned by an item.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    LineString(LineString),
}

/// An editable shape of either kind.
#[derive(Debug, Clone)]
pub enum ShapeItem {
    Area(AreaEditor),
    Polyline(PolylineEditor),
}

impl ShapeItem {
    pub fn area(polygon: Polygon, view: &dyn RegionBuilder) -> Self {
        ShapeItem::Area(AreaEditor::new(polygon, view))
    }

    pub fn polyline(line: LineString, view: &dyn RegionBuilder) -> Self {
        ShapeItem::Polyline(PolylineEditor::new(line, view))
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeItem::Area(_) => ShapeKind::Area,
            ShapeItem::Polyline(_) => ShapeKind::Polyline,
        }
    }

    pub fn geometry(&self) -> Geometry {
        match self {
            ShapeItem::Area(a) => Geometry::Polygon(a.geometry()),
            ShapeItem::Polyline(p) => Geometry::LineString(p.geometry()),
        }
    }

    /// Drive a running merge animation. Polygons merge instantly.
    pub fn advance_animation(&mut self, view: &dyn RegionBuilder) -> AnimationStatus {
        match self {
            ShapeItem::Area(_) => AnimationStatus::Idle,
            ShapeItem::Polyline(p) => p.advance_animation(view),
        }
    }

    pub fn as_area(&self) -> Option<&AreaEditor> {
        match self {
            ShapeItem::Area(a) => Some(a),
            ShapeItem::Polyline(_) => None,
        }
    }

    pub fn as_polyline(&self) -> Option<&PolylineEditor> {
        match self {
            ShapeItem::Polyline(p) => Some(p),
            ShapeItem::Area(_) => None,
        }
    }

    fn editable(&self) -> &dyn EditableShape {
        match self {
            ShapeItem::Area(a) => a,
            ShapeItem::Polyline(p) => p,
        }
    }

    fn editable_mut(&mut self) -> &mut dyn EditableShape {
        match self {
            ShapeItem::Area(a) => a,
            ShapeItem::Polyline(p) => p,
        }
    }
}

impl EditableShape for ShapeItem {
    fn id(&self) -> ShapeId {
        self.editable().id()
    }

    fn state(&self) -> ActionState {
        self.editable().state()
    }

    fn is_busy(&self) -> bool {
        self.editable().is_busy()
    }

    fn handle_event(&mut self, event: &PointerEvent, view: &dyn RegionBuilder) -> bool {
        self.editable_mut().handle_event(event, view)
    }

    fn contains_point(&self, point: Point) -> bool {
        self.editable().contains_point(point)
    }

    fn set_state(
        &mut self,
        state: ActionState,
        view: &dyn RegionBuilder,
    ) -> EditResult<Option<StateChange>> {
        self.editable_mut().set_state(state, view)
    }

    fn notify_other_item_changed(&mut self, view: &dyn RegionBuilder) {
        self.editable_mut().notify_other_item_changed(view)
    }

    fn refresh_regions(&mut self, view: &dyn RegionBuilder) {
        self.editable_mut().refresh_regions(view)
    }

    fn request(&self) -> Option<Request> {
        self.editable().request()
    }

    fn take_request(&mut self) -> Option<Request> {
        self.editable_mut().take_request()
    }

    fn delete_selected_nodes(&mut self, view: &dyn RegionBuilder) -> EditResult<DeleteOutcome> {
        self.editable_mut().delete_selected_nodes(view)
    }

    fn delete_clicked_node(&mut self, view: &dyn RegionBuilder) -> EditResult<DeleteOutcome> {
        self.editable_mut().delete_clicked_node(view)
    }

    fn toggle_clicked_node_selection(&mut self) -> EditResult<bool> {
        self.editable_mut().toggle_clicked_node_selection()
    }

    fn clicked_node_is_selected(&self) -> Option<bool> {
        self.editable().clicked_node_is_selected()
    }

    fn has_nodes_selected(&self) -> bool {
        self.editable().has_nodes_selected()
    }
}

/// Route editor logs to the test harness; honours `RUST_LOG`.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;
    use crate::geo::{Coordinate, Ring};
    use crate::input::MouseButton;
    use crate::viewport::{MapViewport, Viewport};
    use kurbo::Vec2;

    fn view() -> MapViewport {
        MapViewport::new(Vec2::new(0.0, 1000.0), 100.0)
    }

    fn coords(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points
            .iter()
            .map(|&(lon, lat)| Coordinate::from_degrees(lon, lat))
            .collect()
    }

    fn items() -> Vec<ShapeItem> {
        init_test_logging();
        let view = view();
        vec![
            ShapeItem::area(
                Polygon::new(Ring::from(coords(&[
                    (0.0, 0.0),
                    (2.0, 0.0),
                    (2.0, 2.0),
                    (0.0, 2.0),
                ]))),
                &view,
            ),
            ShapeItem::polyline(
                LineString::from(coords(&[(5.0, 0.0), (6.0, 0.0), (7.0, 0.0)])),
                &view,
            ),
        ]
    }

    #[test]
    fn test_host_routes_to_item_under_pointer() {
        let view = view();
        let mut items = items();
        let point = view
            .geographic_to_screen(&Coordinate::from_degrees(6.0, 0.0))
            .unwrap();

        let target = items.iter().position(|item| item.contains_point(point));
        assert_eq!(target, Some(1));
        let item = &mut items[1];
        assert_eq!(item.kind(), ShapeKind::Polyline);
        assert!(item.handle_event(&PointerEvent::press(point, MouseButton::Right), &view));
        assert_eq!(item.take_request(), Some(Request::ShowNodeMenu));
        assert_eq!(item.clicked_node_is_selected(), Some(false));
    }

    #[test]
    fn test_state_change_carries_item_id() {
        let view = view();
        let mut items = items();
        let ids: Vec<ShapeId> = items.iter().map(EditableShape::id).collect();
        assert_ne!(ids[0], ids[1]);

        let change = items[0]
            .set_state(ActionState::AddingHole, &view)
            .unwrap()
            .unwrap();
        assert_eq!(change.id, ids[0]);
        assert_eq!(change.current, ActionState::AddingHole);

        assert_eq!(
            items[1].set_state(ActionState::AddingHole, &view),
            Err(EditError::UnsupportedState(ActionState::AddingHole))
        );
    }

    #[test]
    fn test_geometry_by_kind() {
        let items = items();
        assert!(matches!(items[0].geometry(), Geometry::Polygon(ref p) if p.outer.len() == 4));
        assert!(matches!(items[1].geometry(), Geometry::LineString(ref l) if l.len() == 3));
        assert!(items[0].as_area().is_some());
        assert!(items[0].as_polyline().is_none());
    }

    #[test]
    fn test_area_never_animates() {
        let mut items = items();
        assert_eq!(items[0].advance_animation(&view()), AnimationStatus::Idle);
        assert!(!items[0].is_busy());
    }
}
