//! Editing states, host requests and state-change notifications.

use crate::error::EditError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shape items.
pub type ShapeId = Uuid;

/// Interaction mode announced by the host to every shape item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionState {
    /// Select, move and delete nodes or the whole shape.
    #[default]
    Editing,
    /// Appending nodes while the shape is first created.
    DrawingNew,
    /// Drawing a hole inside a polygon.
    AddingHole,
    /// Picking pairs of nodes to merge.
    MergingNodes,
    /// Inserting nodes through virtual midpoints.
    AddingNodes,
}

/// States of a polygon item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AreaState {
    #[default]
    Editing,
    DrawingNew,
    AddingHole,
    MergingNodes,
    AddingNodes,
}

impl From<AreaState> for ActionState {
    fn from(state: AreaState) -> Self {
        match state {
            AreaState::Editing => ActionState::Editing,
            AreaState::DrawingNew => ActionState::DrawingNew,
            AreaState::AddingHole => ActionState::AddingHole,
            AreaState::MergingNodes => ActionState::MergingNodes,
            AreaState::AddingNodes => ActionState::AddingNodes,
        }
    }
}

impl TryFrom<ActionState> for AreaState {
    type Error = EditError;

    fn try_from(state: ActionState) -> Result<Self, Self::Error> {
        Ok(match state {
            ActionState::Editing => AreaState::Editing,
            ActionState::DrawingNew => AreaState::DrawingNew,
            ActionState::AddingHole => AreaState::AddingHole,
            ActionState::MergingNodes => AreaState::MergingNodes,
            ActionState::AddingNodes => AreaState::AddingNodes,
        })
    }
}

/// States of a polyline item. Polylines have no holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolylineState {
    #[default]
    Editing,
    DrawingNew,
    MergingNodes,
    AddingNodes,
}

impl From<PolylineState> for ActionState {
    fn from(state: PolylineState) -> Self {
        match state {
            PolylineState::Editing => ActionState::Editing,
            PolylineState::DrawingNew => ActionState::DrawingNew,
            PolylineState::MergingNodes => ActionState::MergingNodes,
            PolylineState::AddingNodes => ActionState::AddingNodes,
        }
    }
}

impl TryFrom<ActionState> for PolylineState {
    type Error = EditError;

    fn try_from(state: ActionState) -> Result<Self, Self::Error> {
        match state {
            ActionState::Editing => Ok(PolylineState::Editing),
            ActionState::DrawingNew => Ok(PolylineState::DrawingNew),
            ActionState::MergingNodes => Ok(PolylineState::MergingNodes),
            ActionState::AddingNodes => Ok(PolylineState::AddingNodes),
            ActionState::AddingHole => Err(EditError::UnsupportedState(state)),
        }
    }
}

/// Something the host should present or act on after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Request {
    /// A node was right-clicked.
    ShowNodeMenu,
    /// The polygon interior was right-clicked.
    ShowPolygonMenu,
    /// The polyline body was right-clicked.
    ShowPolylineMenu,
    /// The shape became degenerate and should be deleted.
    RemoveShape,
    /// A merge animation was started; drive it with `advance_animation`.
    StartMergeAnimation,
    /// The edit was refused because a hole would leave the outer boundary.
    InvalidShapeWarning,
    /// Attempted to merge an outer node with a hole node.
    OuterInnerMergingWarning,
    /// Attempted to merge nodes of two different holes.
    InnerInnerMergingWarning,
}

/// Emitted when an item's state actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub id: ShapeId,
    pub previous: ActionState,
    pub current: ActionState,
}

/// Result of a node deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// This many nodes were removed; the shape is still valid.
    Removed(usize),
    /// The deletion would leave a degenerate shape; the geometry is
    /// unchanged and [`Request::RemoveShape`] was raised.
    ShapeRemoved,
}

/// Progress of a merge animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    /// No animation is running.
    Idle,
    Running,
    /// The last step ran and the merge was committed.
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_rejects_adding_hole() {
        assert_eq!(
            PolylineState::try_from(ActionState::AddingHole),
            Err(EditError::UnsupportedState(ActionState::AddingHole))
        );
        assert_eq!(
            PolylineState::try_from(ActionState::MergingNodes),
            Ok(PolylineState::MergingNodes)
        );
    }

    #[test]
    fn test_area_accepts_every_state() {
        for state in [
            ActionState::Editing,
            ActionState::DrawingNew,
            ActionState::AddingHole,
            ActionState::MergingNodes,
            ActionState::AddingNodes,
        ] {
            let area = AreaState::try_from(state).unwrap();
            assert_eq!(ActionState::from(area), state);
        }
    }

    #[test]
    fn test_default_state_is_editing() {
        assert_eq!(ActionState::default(), ActionState::Editing);
    }
}
