//! Polygon editing: the outer ring, its holes and their nodes.

use super::EditableShape;
use super::dispatch::{HandlerSet, ignore_move};
use super::state::{ActionState, AreaState, DeleteOutcome, Request, ShapeId, StateChange};
use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::geo::{Coordinate, MIN_NODES, Polygon, Ring, holes_within};
use crate::input::{MouseButton, PointerEvent, PressTracker};
use crate::node::{
    Node, NodeFlags, NodeSeq, VirtualNode, shift_after_insertion, shift_after_removal,
};
use crate::region::{Region, RegionBuilder};
use kurbo::Point;
use uuid::Uuid;

/// Address of a node within a polygon.
///
/// Ordered outer-ring first, then by hole and node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeRef {
    Outer(usize),
    Inner { hole: usize, node: usize },
}

impl NodeRef {
    /// Position within the owning ring.
    pub fn index(self) -> usize {
        match self {
            NodeRef::Outer(index) => index,
            NodeRef::Inner { node, .. } => node,
        }
    }

    /// Hole index, `None` for the outer ring.
    pub fn hole(self) -> Option<usize> {
        match self {
            NodeRef::Outer(_) => None,
            NodeRef::Inner { hole, .. } => Some(hole),
        }
    }

    pub fn same_ring(self, other: NodeRef) -> bool {
        self.hole() == other.hole()
    }

    fn with_index(self, index: usize) -> NodeRef {
        match self {
            NodeRef::Outer(_) => NodeRef::Outer(index),
            NodeRef::Inner { hole, .. } => NodeRef::Inner { hole, node: index },
        }
    }

    fn after_node_removal(self, removed: NodeRef) -> Option<NodeRef> {
        if !self.same_ring(removed) {
            return Some(self);
        }
        shift_after_removal(self.index(), removed.index()).map(|i| self.with_index(i))
    }

    fn after_node_insertion(self, inserted: NodeRef) -> NodeRef {
        if !self.same_ring(inserted) {
            return self;
        }
        self.with_index(shift_after_insertion(self.index(), inserted.index()))
    }

    fn after_hole_removal(self, removed: usize) -> Option<NodeRef> {
        match self {
            NodeRef::Outer(_) => Some(self),
            NodeRef::Inner { hole, node } => {
                shift_after_removal(hole, removed).map(|hole| NodeRef::Inner { hole, node })
            }
        }
    }
}

/// The single multi-event edit in progress.
#[derive(Debug, Clone)]
enum Pending {
    NodeDrag {
        node: NodeRef,
        press: PressTracker,
        refused: bool,
    },
    ShapeDrag {
        anchor: Coordinate,
    },
    HoleDraft(NodeSeq),
    MergeFirst(NodeRef),
    Adjusting {
        node: NodeRef,
        refused: bool,
    },
}

/// Everything a rollback has to put back.
struct Snapshot {
    outer: NodeSeq,
    holes: Vec<NodeSeq>,
    outer_region: Region,
    hole_regions: Vec<Region>,
    clicked: Option<NodeRef>,
    hovered: Option<NodeRef>,
}

/// Interactive editor for one polygon.
#[derive(Debug, Clone)]
pub struct AreaEditor {
    id: ShapeId,
    state: AreaState,
    outer: NodeSeq,
    holes: Vec<NodeSeq>,
    outer_region: Region,
    hole_regions: Vec<Region>,
    virtual_nodes: Vec<VirtualNode>,
    pending: Option<Pending>,
    /// Node the last context menu was opened on.
    clicked: Option<NodeRef>,
    hovered: Option<NodeRef>,
    request: Option<Request>,
    config: EditorConfig,
}

impl AreaState {
    fn handlers(self) -> HandlerSet<AreaEditor> {
        match self {
            AreaState::Editing => HandlerSet {
                press: AreaEditor::editing_press,
                moved: AreaEditor::editing_move,
                release: AreaEditor::editing_release,
            },
            AreaState::DrawingNew => HandlerSet {
                press: AreaEditor::drawing_press,
                moved: ignore_move,
                release: AreaEditor::drawing_release,
            },
            AreaState::AddingHole => HandlerSet {
                press: AreaEditor::hole_press,
                moved: AreaEditor::hole_move,
                release: AreaEditor::hole_release,
            },
            AreaState::MergingNodes => HandlerSet {
                press: AreaEditor::merging_press,
                moved: AreaEditor::merging_move,
                release: AreaEditor::merging_release,
            },
            AreaState::AddingNodes => HandlerSet {
                press: AreaEditor::adding_press,
                moved: AreaEditor::adding_move,
                release: AreaEditor::adding_release,
            },
        }
    }
}

impl AreaEditor {
    pub fn new(polygon: Polygon, view: &dyn RegionBuilder) -> Self {
        Self::with_config(polygon, EditorConfig::default(), view)
    }

    pub fn with_config(polygon: Polygon, config: EditorConfig, view: &dyn RegionBuilder) -> Self {
        if !polygon.is_valid() {
            log::warn!("editing a polygon whose holes leave the outer boundary");
        }

        let mut editor = Self {
            id: Uuid::new_v4(),
            state: AreaState::Editing,
            outer: NodeSeq::from_coords(polygon.outer.points),
            holes: polygon
                .inner
                .into_iter()
                .map(|ring| NodeSeq::from_coords(ring.points))
                .collect(),
            outer_region: Region::Empty,
            hole_regions: Vec::new(),
            virtual_nodes: Vec::new(),
            pending: None,
            clicked: None,
            hovered: None,
            request: None,
            config,
        };
        editor.refresh_regions(view);
        editor
    }

    /// An empty polygon that collects nodes from left presses.
    pub fn drawing(config: EditorConfig, view: &dyn RegionBuilder) -> Self {
        let mut editor = Self::with_config(Polygon::default(), config, view);
        editor.state = AreaState::DrawingNew;
        editor
    }

    pub fn area_state(&self) -> AreaState {
        self.state
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Committed geometry. A hole still being drawn is not part of it.
    pub fn geometry(&self) -> Polygon {
        Polygon {
            outer: Ring::from(self.outer.coords().to_vec()),
            inner: self
                .holes
                .iter()
                .map(|hole| Ring::from(hole.coords().to_vec()))
                .collect(),
        }
    }

    pub fn outer(&self) -> &NodeSeq {
        &self.outer
    }

    pub fn holes(&self) -> &[NodeSeq] {
        &self.holes
    }

    /// Hole being drawn in `AddingHole`.
    pub fn hole_draft(&self) -> Option<&NodeSeq> {
        match &self.pending {
            Some(Pending::HoleDraft(draft)) => Some(draft),
            _ => None,
        }
    }

    pub fn virtual_nodes(&self) -> &[VirtualNode] {
        &self.virtual_nodes
    }

    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        self.ring(node.hole())?.node(node.index())
    }

    pub fn coord(&self, node: NodeRef) -> Option<Coordinate> {
        self.ring(node.hole())?.coord(node.index()).copied()
    }

    /// First pick of a merge in progress.
    pub fn merge_candidate(&self) -> Option<NodeRef> {
        match self.pending {
            Some(Pending::MergeFirst(node)) => Some(node),
            _ => None,
        }
    }

    /// Node inserted from a virtual node that still follows the pointer.
    pub fn adjusting_node(&self) -> Option<NodeRef> {
        match self.pending {
            Some(Pending::Adjusting { node, .. }) => Some(node),
            _ => None,
        }
    }

    pub fn clicked_node(&self) -> Option<NodeRef> {
        self.clicked
    }

    pub fn selected_nodes(&self) -> Vec<NodeRef> {
        let outer = self.outer.selected().into_iter().map(NodeRef::Outer);
        let inner = self.holes.iter().enumerate().flat_map(|(hole, seq)| {
            seq.selected()
                .into_iter()
                .map(move |node| NodeRef::Inner { hole, node })
        });
        outer.chain(inner).collect()
    }

    /// Every hole point lies within the outer ring.
    pub fn is_valid_polygon(&self) -> bool {
        holes_within(self.outer.coords(), self.holes.iter().map(NodeSeq::coords))
    }

    /// The point is inside a hole. With `restrictive`, points on a node of
    /// any ring do not count.
    pub fn is_inner_bounds_point(&self, point: Point, restrictive: bool) -> bool {
        if self.hole_at(point).is_none() {
            return false;
        }
        !restrictive || self.node_at(point).is_none()
    }

    // --- hit testing ---

    fn inner_node_at(&self, point: Point) -> Option<NodeRef> {
        self.holes.iter().enumerate().find_map(|(hole, seq)| {
            seq.hit(point).map(|node| NodeRef::Inner { hole, node })
        })
    }

    fn node_at(&self, point: Point) -> Option<NodeRef> {
        self.outer
            .hit(point)
            .map(NodeRef::Outer)
            .or_else(|| self.inner_node_at(point))
    }

    fn virtual_node_at(&self, point: Point) -> Option<usize> {
        self.virtual_nodes
            .iter()
            .position(|v| v.region.contains(point))
    }

    fn hole_at(&self, point: Point) -> Option<usize> {
        self.hole_regions.iter().position(|r| r.contains(point))
    }

    /// Inside the outer ring and outside every hole.
    fn interior_contains(&self, point: Point) -> bool {
        self.outer_region.contains(point) && self.hole_at(point).is_none()
    }

    // --- storage bookkeeping ---

    fn ring(&self, hole: Option<usize>) -> Option<&NodeSeq> {
        match hole {
            None => Some(&self.outer),
            Some(hole) => self.holes.get(hole),
        }
    }

    fn ring_mut(&mut self, hole: Option<usize>) -> Option<&mut NodeSeq> {
        match hole {
            None => Some(&mut self.outer),
            Some(hole) => self.holes.get_mut(hole),
        }
    }

    fn node_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
        self.ring_mut(node.hole())?.node_mut(node.index())
    }

    fn node_region(&self, coord: &Coordinate, view: &dyn RegionBuilder) -> Region {
        let r = self.config.node_hit_radius;
        view.ellipse_region(coord, r, r)
    }

    /// Apply an index remapping to every stored node reference.
    fn fix_refs(&mut self, f: impl Fn(NodeRef) -> Option<NodeRef>) {
        self.clicked = self.clicked.and_then(&f);
        self.hovered = self.hovered.and_then(&f);
        self.pending = match self.pending.take() {
            Some(Pending::NodeDrag {
                node,
                press,
                refused,
            }) => f(node).map(|node| Pending::NodeDrag {
                node,
                press,
                refused,
            }),
            Some(Pending::MergeFirst(node)) => f(node).map(Pending::MergeFirst),
            Some(Pending::Adjusting { node, refused }) => {
                f(node).map(|node| Pending::Adjusting { node, refused })
            }
            other => other,
        };
    }

    fn remove_node(&mut self, at: NodeRef) -> Option<Coordinate> {
        let (coord, _) = self.ring_mut(at.hole())?.remove(at.index())?;
        self.fix_refs(|r| r.after_node_removal(at));
        Some(coord)
    }

    fn insert_node(&mut self, at: NodeRef, coord: Coordinate, node: Node) {
        if let Some(ring) = self.ring_mut(at.hole()) {
            ring.insert(at.index(), coord, node);
            self.fix_refs(|r| Some(r.after_node_insertion(at)));
        }
    }

    fn remove_hole(&mut self, hole: usize) {
        if hole >= self.holes.len() {
            return;
        }
        self.holes.remove(hole);
        if hole < self.hole_regions.len() {
            self.hole_regions.remove(hole);
        }
        self.fix_refs(|r| r.after_hole_removal(hole));
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            outer: self.outer.clone(),
            holes: self.holes.clone(),
            outer_region: self.outer_region.clone(),
            hole_regions: self.hole_regions.clone(),
            clicked: self.clicked,
            hovered: self.hovered,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.outer = snapshot.outer;
        self.holes = snapshot.holes;
        self.outer_region = snapshot.outer_region;
        self.hole_regions = snapshot.hole_regions;
        self.clicked = snapshot.clicked;
        self.hovered = snapshot.hovered;
    }

    fn refresh_boundaries(&mut self, view: &dyn RegionBuilder) {
        self.outer_region = view.polygon_region(self.outer.coords());
        self.hole_regions = self
            .holes
            .iter()
            .map(|hole| view.polygon_region(hole.coords()))
            .collect();
    }

    /// Virtual node i sits between nodes i-1 and i; node 0 pairs with the
    /// last node.
    fn build_virtual_nodes(&self, view: &dyn RegionBuilder) -> Vec<VirtualNode> {
        let coords = self.outer.coords();
        let n = coords.len();
        if n < 2 {
            return Vec::new();
        }

        let r = self.config.virtual_node_hit_radius;
        (0..n)
            .map(|i| {
                let prev = if i == 0 { n - 1 } else { i - 1 };
                let coord = coords[prev].interpolate(&coords[i], 0.5);
                VirtualNode {
                    insert_at: i,
                    coord,
                    region: view.ellipse_region(&coord, r, r),
                    hovered: false,
                }
            })
            .collect()
    }

    fn clear_hover(&mut self) {
        if let Some(node) = self.hovered.take() {
            if let Some(n) = self.node_mut(node) {
                n.set_flag(NodeFlags::HOVERED, false);
            }
        }
        for v in &mut self.virtual_nodes {
            v.hovered = false;
        }
    }

    /// Move the hover highlight to the node under `point`.
    fn update_hover(&mut self, point: Point, flag: NodeFlags) -> bool {
        let hit = self.node_at(point);
        if hit == self.hovered {
            return hit.is_some();
        }

        self.clear_hover();
        if let Some(node) = hit {
            if let Some(n) = self.node_mut(node) {
                n.set_flag(flag, true);
            }
        }
        self.hovered = hit;
        hit.is_some()
    }

    /// Move one node to the pointer. Returns false, leaving the node where it
    /// was, when the new position would invalidate the polygon.
    fn move_node(&mut self, node: NodeRef, point: Point, view: &dyn RegionBuilder) -> bool {
        let Some(coord) = view.screen_to_geographic(point) else {
            return true;
        };
        let Some(previous) = self.coord(node) else {
            return true;
        };

        let region = self.node_region(&coord, view);
        if let Some(ring) = self.ring_mut(node.hole()) {
            ring.set_coord(node.index(), coord, region);
        }

        if !self.is_valid_polygon() {
            let region = self.node_region(&previous, view);
            if let Some(ring) = self.ring_mut(node.hole()) {
                ring.set_coord(node.index(), previous, region);
            }
            log::debug!("refused moving {:?} of area {}", node, self.id);
            return false;
        }

        self.refresh_boundaries(view);
        true
    }

    /// Displace every node by the great-circle step from `from` to `to`.
    fn translate(&mut self, from: Coordinate, to: Coordinate, view: &dyn RegionBuilder) {
        let bearing = from.bearing(&to);
        let distance = from.distance(&to);
        let snapshot = self.snapshot();
        let r = self.config.node_hit_radius;

        let rings = std::iter::once(&mut self.outer).chain(self.holes.iter_mut());
        for ring in rings {
            for i in 0..ring.len() {
                let Some(coord) = ring.coord(i).copied() else {
                    continue;
                };
                let moved = coord.move_by_bearing(bearing, distance).normalized();
                let region = view.ellipse_region(&moved, r, r);
                ring.set_coord(i, moved, region);
            }
        }

        if !self.is_valid_polygon() {
            log::debug!("refused translating area {}", self.id);
            self.restore(snapshot);
            return;
        }
        self.refresh_boundaries(view);
    }

    // --- DrawingNew ---

    fn drawing_press(
        &mut self,
        point: Point,
        button: MouseButton,
        view: &dyn RegionBuilder,
    ) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        let Some(coord) = view.screen_to_geographic(point) else {
            return false;
        };

        let region = self.node_region(&coord, view);
        self.outer.push(coord, Node::new(region));
        self.refresh_boundaries(view);
        true
    }

    fn drawing_release(&mut self, _: Point, button: MouseButton, _: &dyn RegionBuilder) -> bool {
        button == MouseButton::Left
    }

    // --- Editing ---

    fn editing_press(
        &mut self,
        point: Point,
        button: MouseButton,
        view: &dyn RegionBuilder,
    ) -> bool {
        if let Some(node) = self.node_at(point) {
            if button == MouseButton::Left {
                self.pending = Some(Pending::NodeDrag {
                    node,
                    press: PressTracker::new(point),
                    refused: false,
                });
            } else {
                self.clicked = Some(node);
                self.request = Some(Request::ShowNodeMenu);
            }
            return true;
        }

        if !self.interior_contains(point) {
            return false;
        }

        if button == MouseButton::Left {
            let Some(anchor) = view.screen_to_geographic(point) else {
                return false;
            };
            self.pending = Some(Pending::ShapeDrag { anchor });
        } else {
            self.clicked = None;
            self.request = Some(Request::ShowPolygonMenu);
        }
        true
    }

    fn editing_move(&mut self, point: Point, view: &dyn RegionBuilder) -> bool {
        match self.pending {
            Some(Pending::NodeDrag { node, .. }) => {
                let accepted = self.move_node(node, point, view);
                if let Some(Pending::NodeDrag { press, refused, .. }) = &mut self.pending {
                    press.update(point);
                    *refused |= !accepted;
                }
                true
            }
            Some(Pending::ShapeDrag { anchor }) => {
                if let Some(target) = view.screen_to_geographic(point) {
                    self.translate(anchor, target, view);
                    self.pending = Some(Pending::ShapeDrag { anchor: target });
                }
                true
            }
            _ => self.update_hover(point, NodeFlags::EDITING_HOVERED),
        }
    }

    fn editing_release(
        &mut self,
        point: Point,
        button: MouseButton,
        _: &dyn RegionBuilder,
    ) -> bool {
        if button != MouseButton::Left {
            return false;
        }

        match self.pending.take() {
            Some(Pending::NodeDrag {
                node,
                press,
                refused,
            }) => {
                if refused {
                    log::warn!("move of {:?} refused: hole would leave area {}", node, self.id);
                    self.request = Some(Request::InvalidShapeWarning);
                } else if press.is_click(point, self.config.click_tolerance) {
                    if let Some(n) = self.node_mut(node) {
                        let selected = n.is_selected();
                        n.set_flag(NodeFlags::SELECTED, !selected);
                    }
                }
                true
            }
            Some(Pending::ShapeDrag { .. }) => true,
            other => {
                self.pending = other;
                false
            }
        }
    }

    // --- AddingHole ---

    fn hole_press(&mut self, point: Point, button: MouseButton, view: &dyn RegionBuilder) -> bool {
        if button != MouseButton::Left || !self.contains_point(point) {
            return false;
        }
        let Some(coord) = view.screen_to_geographic(point) else {
            return false;
        };

        let node = Node::with_flags(self.node_region(&coord, view), NodeFlags::TEMPORARY_HOLE);
        match &mut self.pending {
            Some(Pending::HoleDraft(draft)) => draft.push(coord, node),
            _ => {
                let mut draft = NodeSeq::new();
                draft.push(coord, node);
                self.pending = Some(Pending::HoleDraft(draft));
            }
        }
        true
    }

    fn hole_move(&mut self, _: Point, _: &dyn RegionBuilder) -> bool {
        self.hole_draft().is_some()
    }

    fn hole_release(&mut self, _: Point, button: MouseButton, _: &dyn RegionBuilder) -> bool {
        button == MouseButton::Left && self.hole_draft().is_some()
    }

    /// Commit the hole draft when it can bound something, otherwise drop it.
    fn finish_hole_draft(&mut self, view: &dyn RegionBuilder) {
        let mut draft = match self.pending.take() {
            Some(Pending::HoleDraft(draft)) => draft,
            other => {
                self.pending = other;
                return;
            }
        };

        if draft.len() < MIN_NODES {
            log::debug!("discarding {}-node hole draft of area {}", draft.len(), self.id);
            return;
        }

        draft.clear_flags(NodeFlags::TEMPORARY_HOLE);
        if !holes_within(self.outer.coords(), std::iter::once(draft.coords())) {
            log::warn!("hole draft leaves area {}; discarded", self.id);
            self.request = Some(Request::InvalidShapeWarning);
            return;
        }

        log::debug!("area {} gained a {}-node hole", self.id, draft.len());
        self.holes.push(draft);
        self.refresh_boundaries(view);
    }

    // --- MergingNodes ---

    fn merging_press(
        &mut self,
        point: Point,
        button: MouseButton,
        view: &dyn RegionBuilder,
    ) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        let Some(node) = self.node_at(point) else {
            return false;
        };

        match self.pending.take() {
            Some(Pending::MergeFirst(first)) if first == node => {
                if let Some(n) = self.node_mut(node) {
                    n.set_flag(NodeFlags::MERGED, false);
                }
            }
            Some(Pending::MergeFirst(first)) if !first.same_ring(node) => {
                if let Some(n) = self.node_mut(first) {
                    n.set_flag(NodeFlags::MERGED, false);
                }
                self.request = Some(if first.hole().is_none() || node.hole().is_none() {
                    Request::OuterInnerMergingWarning
                } else {
                    Request::InnerInnerMergingWarning
                });
            }
            Some(Pending::MergeFirst(first)) => self.merge_nodes(first, node, view),
            _ => {
                if let Some(n) = self.node_mut(node) {
                    n.set_flag(NodeFlags::MERGED, true);
                }
                self.pending = Some(Pending::MergeFirst(node));
            }
        }
        true
    }

    fn merging_move(&mut self, point: Point, _: &dyn RegionBuilder) -> bool {
        self.update_hover(point, NodeFlags::MERGING_HOVERED)
    }

    fn merging_release(
        &mut self,
        point: Point,
        button: MouseButton,
        _: &dyn RegionBuilder,
    ) -> bool {
        button == MouseButton::Left && self.node_at(point).is_some()
    }

    /// Collapse two nodes of the same ring into their midpoint, kept at the
    /// position of `second`.
    fn merge_nodes(&mut self, first: NodeRef, second: NodeRef, view: &dyn RegionBuilder) {
        if let Some(n) = self.node_mut(first) {
            n.set_flag(NodeFlags::MERGED, false);
        }

        let ring_len = self.ring(first.hole()).map_or(0, NodeSeq::len);
        if ring_len <= MIN_NODES {
            match first.hole() {
                None => {
                    log::debug!("merge collapses the outer ring of area {}", self.id);
                    self.request = Some(Request::RemoveShape);
                }
                Some(hole) => {
                    log::debug!("merge collapses hole {} of area {}", hole, self.id);
                    self.remove_hole(hole);
                    self.refresh_boundaries(view);
                }
            }
            return;
        }

        let (Some(a), Some(b)) = (self.coord(first), self.coord(second)) else {
            return;
        };
        let selected = [first, second]
            .iter()
            .any(|&r| self.node(r).is_some_and(Node::is_selected));
        let snapshot = self.snapshot();

        let merged = a.interpolate(&b, 0.5);
        self.remove_node(first);
        let Some(survivor) = second.after_node_removal(first) else {
            self.restore(snapshot);
            return;
        };
        let region = self.node_region(&merged, view);
        if let Some(ring) = self.ring_mut(survivor.hole()) {
            ring.set_coord(survivor.index(), merged, region);
            if let Some(n) = ring.node_mut(survivor.index()) {
                n.set_flag(NodeFlags::SELECTED, selected);
                n.set_flag(NodeFlags::MERGED, false);
            }
        }

        if !self.is_valid_polygon() {
            log::warn!("merge of {:?} and {:?} rolled back on area {}", first, second, self.id);
            self.restore(snapshot);
            self.request = Some(Request::InvalidShapeWarning);
            return;
        }

        log::debug!("merged {:?} into {:?} on area {}", first, survivor, self.id);
        self.refresh_boundaries(view);
    }

    // --- AddingNodes ---

    fn adding_press(
        &mut self,
        point: Point,
        button: MouseButton,
        view: &dyn RegionBuilder,
    ) -> bool {
        if button != MouseButton::Left {
            return false;
        }

        if let Some(Pending::Adjusting { node, refused }) = self.pending {
            self.pending = None;
            if refused {
                self.request = Some(Request::InvalidShapeWarning);
            }
            log::debug!("fixed {:?} on area {}", node, self.id);
            return true;
        }

        // Real nodes shadow the virtual nodes of short edges.
        if let Some(node) = self.node_at(point) {
            log::trace!("press on {:?} of area {} inserts nothing", node, self.id);
            return true;
        }

        let Some(hit) = self.virtual_node_at(point) else {
            return false;
        };
        let Some(virtual_node) = self.virtual_nodes.get(hit).cloned() else {
            return false;
        };

        let at = NodeRef::Outer(virtual_node.insert_at);
        let region = self.node_region(&virtual_node.coord, view);
        self.insert_node(at, virtual_node.coord, Node::new(region));

        if !self.is_valid_polygon() {
            self.remove_node(at);
            log::warn!("inserting at {:?} would invalidate area {}", at, self.id);
            self.request = Some(Request::InvalidShapeWarning);
            return true;
        }

        log::debug!("promoted virtual node to {:?} on area {}", at, self.id);
        self.pending = Some(Pending::Adjusting {
            node: at,
            refused: false,
        });
        self.refresh_boundaries(view);
        self.virtual_nodes = self.build_virtual_nodes(view);
        true
    }

    fn adding_move(&mut self, point: Point, view: &dyn RegionBuilder) -> bool {
        if let Some(Pending::Adjusting { node, .. }) = self.pending {
            let accepted = self.move_node(node, point, view);
            if let Some(Pending::Adjusting { refused, .. }) = &mut self.pending {
                *refused |= !accepted;
            }
            self.virtual_nodes = self.build_virtual_nodes(view);
            return true;
        }

        let hit = match self.node_at(point) {
            Some(_) => None,
            None => self.virtual_node_at(point),
        };
        for (i, v) in self.virtual_nodes.iter_mut().enumerate() {
            v.hovered = Some(i) == hit;
        }
        hit.is_some()
    }

    fn adding_release(&mut self, point: Point, button: MouseButton, _: &dyn RegionBuilder) -> bool {
        button == MouseButton::Left
            && (self.adjusting_node().is_some()
                || self.outer.hit(point).is_some()
                || self.virtual_node_at(point).is_some())
    }

    // --- state hooks ---

    fn leave_state(&mut self, view: &dyn RegionBuilder) {
        self.clear_hover();
        match self.state {
            AreaState::DrawingNew => {
                if self.outer.len() < MIN_NODES {
                    log::debug!("area {} left drawing with {} nodes", self.id, self.outer.len());
                    self.request = Some(Request::RemoveShape);
                }
            }
            AreaState::Editing => self.clicked = None,
            AreaState::AddingHole => self.finish_hole_draft(view),
            AreaState::MergingNodes => {
                self.outer.clear_flags(NodeFlags::MERGED);
                for hole in &mut self.holes {
                    hole.clear_flags(NodeFlags::MERGED);
                }
            }
            AreaState::AddingNodes => self.virtual_nodes.clear(),
        }
        self.pending = None;
    }

    fn enter_state(&mut self, view: &dyn RegionBuilder) {
        if self.state == AreaState::AddingNodes {
            self.virtual_nodes = self.build_virtual_nodes(view);
        }
    }

    fn require_editing(&self) -> EditResult<()> {
        if self.state != AreaState::Editing {
            return Err(EditError::WrongState {
                expected: ActionState::Editing,
                actual: self.state.into(),
            });
        }
        Ok(())
    }

    /// Remove `doomed` nodes, dropping holes that become degenerate, and roll
    /// everything back if the polygon would be degenerate or invalid.
    fn delete_nodes(
        &mut self,
        mut doomed: Vec<NodeRef>,
        view: &dyn RegionBuilder,
    ) -> EditResult<DeleteOutcome> {
        if doomed.is_empty() {
            return Ok(DeleteOutcome::Removed(0));
        }

        let snapshot = self.snapshot();
        // Highest index first so earlier removals do not shift later ones.
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        doomed.dedup();
        for &node in &doomed {
            self.remove_node(node);
        }
        for hole in (0..self.holes.len()).rev() {
            if self.holes[hole].len() < MIN_NODES {
                log::debug!("dropping degenerate hole {} of area {}", hole, self.id);
                self.remove_hole(hole);
            }
        }

        if self.outer.len() < MIN_NODES {
            self.restore(snapshot);
            log::debug!("deleting {} nodes removes area {}", doomed.len(), self.id);
            self.request = Some(Request::RemoveShape);
            return Ok(DeleteOutcome::ShapeRemoved);
        }

        if !self.is_valid_polygon() {
            self.restore(snapshot);
            log::warn!("deleting {} nodes would invalidate area {}", doomed.len(), self.id);
            self.request = Some(Request::InvalidShapeWarning);
            return Err(EditError::InvalidShape);
        }

        self.refresh_boundaries(view);
        Ok(DeleteOutcome::Removed(doomed.len()))
    }
}

impl EditableShape for AreaEditor {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn state(&self) -> ActionState {
        self.state.into()
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn handle_event(&mut self, event: &PointerEvent, view: &dyn RegionBuilder) -> bool {
        self.request = None;
        let handled = self.state.handlers().dispatch(self, event, view);
        log::trace!("area {} {:?} in {:?}: {}", self.id, event, self.state, handled);
        handled
    }

    fn contains_point(&self, point: Point) -> bool {
        match self.state {
            AreaState::Editing => self.node_at(point).is_some() || self.interior_contains(point),
            AreaState::DrawingNew => true,
            AreaState::AddingHole => self.interior_contains(point) && self.node_at(point).is_none(),
            AreaState::MergingNodes => self.node_at(point).is_some(),
            AreaState::AddingNodes => {
                self.virtual_node_at(point).is_some()
                    || self.outer.hit(point).is_some()
                    || self.outer_region.contains(point)
            }
        }
    }

    fn set_state(
        &mut self,
        state: ActionState,
        view: &dyn RegionBuilder,
    ) -> EditResult<Option<StateChange>> {
        let next = AreaState::try_from(state)?;
        if next == self.state {
            return Ok(None);
        }

        let previous = self.state;
        self.leave_state(view);
        self.state = next;
        self.enter_state(view);
        log::debug!("area {} state {:?} -> {:?}", self.id, previous, next);

        Ok(Some(StateChange {
            id: self.id,
            previous: previous.into(),
            current: next.into(),
        }))
    }

    fn notify_other_item_changed(&mut self, view: &dyn RegionBuilder) {
        self.clear_hover();
        if self.state == AreaState::AddingHole {
            self.finish_hole_draft(view);
        }
    }

    fn refresh_regions(&mut self, view: &dyn RegionBuilder) {
        let r = self.config.node_hit_radius;
        self.outer.rebuild_regions(view, r);
        for hole in &mut self.holes {
            hole.rebuild_regions(view, r);
        }
        if let Some(Pending::HoleDraft(draft)) = &mut self.pending {
            draft.rebuild_regions(view, r);
        }
        self.refresh_boundaries(view);

        if self.state == AreaState::AddingNodes {
            let hovered = self.virtual_nodes.iter().position(|v| v.hovered);
            self.virtual_nodes = self.build_virtual_nodes(view);
            if let Some(v) = hovered.and_then(|i| self.virtual_nodes.get_mut(i)) {
                v.hovered = true;
            }
        }
    }

    fn request(&self) -> Option<Request> {
        self.request
    }

    fn take_request(&mut self) -> Option<Request> {
        self.request.take()
    }

    fn delete_selected_nodes(&mut self, view: &dyn RegionBuilder) -> EditResult<DeleteOutcome> {
        self.require_editing()?;
        self.request = None;
        let doomed = self.selected_nodes();
        self.delete_nodes(doomed, view)
    }

    fn delete_clicked_node(&mut self, view: &dyn RegionBuilder) -> EditResult<DeleteOutcome> {
        self.require_editing()?;
        self.request = None;
        let node = self.clicked.ok_or(EditError::NoClickedNode)?;
        self.delete_nodes(vec![node], view)
    }

    fn toggle_clicked_node_selection(&mut self) -> EditResult<bool> {
        let node = self.clicked.ok_or(EditError::NoClickedNode)?;
        let n = self.node_mut(node).ok_or(EditError::NoClickedNode)?;
        let selected = !n.is_selected();
        n.set_flag(NodeFlags::SELECTED, selected);
        Ok(selected)
    }

    fn clicked_node_is_selected(&self) -> Option<bool> {
        self.clicked
            .and_then(|node| self.node(node))
            .map(Node::is_selected)
    }

    fn has_nodes_selected(&self) -> bool {
        std::iter::once(&self.outer)
            .chain(self.holes.iter())
            .any(|ring| ring.nodes().iter().any(Node::is_selected))
    }
}
