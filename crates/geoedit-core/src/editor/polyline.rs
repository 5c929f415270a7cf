//! Polyline editing, including the animated node merge.

use super::EditableShape;
use super::animation::MergeAnimation;
use super::dispatch::{HandlerSet, ignore_move};
use super::state::{
    ActionState, AnimationStatus, DeleteOutcome, PolylineState, Request, ShapeId, StateChange,
};
use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::geo::{Coordinate, LineString, MIN_NODES};
use crate::input::{MouseButton, PointerEvent, PressTracker};
use crate::node::{
    Node, NodeFlags, NodeSeq, VirtualNode, shift_after_insertion, shift_after_removal,
};
use crate::region::{Region, RegionBuilder};
use kurbo::Point;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
enum Pending {
    NodeDrag { node: usize, press: PressTracker },
    MergeFirst(usize),
    Adjusting(usize),
}

/// Interactive editor for one polyline.
#[derive(Debug, Clone)]
pub struct PolylineEditor {
    id: ShapeId,
    state: PolylineState,
    line: NodeSeq,
    closed: bool,
    line_region: Region,
    virtual_nodes: Vec<VirtualNode>,
    pending: Option<Pending>,
    clicked: Option<usize>,
    hovered: Option<usize>,
    animation: Option<MergeAnimation>,
    request: Option<Request>,
    config: EditorConfig,
}

impl PolylineState {
    fn handlers(self) -> HandlerSet<PolylineEditor> {
        match self {
            PolylineState::Editing => HandlerSet {
                press: PolylineEditor::editing_press,
                moved: PolylineEditor::editing_move,
                release: PolylineEditor::editing_release,
            },
            PolylineState::DrawingNew => HandlerSet {
                press: PolylineEditor::drawing_press,
                moved: ignore_move,
                release: PolylineEditor::drawing_release,
            },
            PolylineState::MergingNodes => HandlerSet {
                press: PolylineEditor::merging_press,
                moved: PolylineEditor::merging_move,
                release: PolylineEditor::merging_release,
            },
            PolylineState::AddingNodes => HandlerSet {
                press: PolylineEditor::adding_press,
                moved: PolylineEditor::adding_move,
                release: PolylineEditor::adding_release,
            },
        }
    }
}

impl PolylineEditor {
    pub fn new(line: LineString, view: &dyn RegionBuilder) -> Self {
        Self::with_config(line, EditorConfig::polyline(), view)
    }

    pub fn with_config(line: LineString, config: EditorConfig, view: &dyn RegionBuilder) -> Self {
        let mut editor = Self {
            id: Uuid::new_v4(),
            state: PolylineState::Editing,
            line: NodeSeq::from_coords(line.points),
            closed: line.closed,
            line_region: Region::Empty,
            virtual_nodes: Vec::new(),
            pending: None,
            clicked: None,
            hovered: None,
            animation: None,
            request: None,
            config,
        };
        editor.refresh_regions(view);
        editor
    }

    /// An empty line that collects nodes from left presses.
    pub fn drawing(config: EditorConfig, view: &dyn RegionBuilder) -> Self {
        let mut editor = Self::with_config(LineString::new(), config, view);
        editor.state = PolylineState::DrawingNew;
        editor
    }

    pub fn polyline_state(&self) -> PolylineState {
        self.state
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn geometry(&self) -> LineString {
        LineString {
            points: self.line.coords().to_vec(),
            closed: self.closed,
        }
    }

    pub fn nodes(&self) -> &NodeSeq {
        &self.line
    }

    pub fn virtual_nodes(&self) -> &[VirtualNode] {
        &self.virtual_nodes
    }

    pub fn animation(&self) -> Option<&MergeAnimation> {
        self.animation.as_ref()
    }

    pub fn merge_candidate(&self) -> Option<usize> {
        match self.pending {
            Some(Pending::MergeFirst(node)) => Some(node),
            _ => None,
        }
    }

    pub fn adjusting_node(&self) -> Option<usize> {
        match self.pending {
            Some(Pending::Adjusting(node)) => Some(node),
            _ => None,
        }
    }

    pub fn clicked_node(&self) -> Option<usize> {
        self.clicked
    }

    pub fn selected_nodes(&self) -> Vec<usize> {
        self.line.selected()
    }

    /// Run one step of the merge animation.
    ///
    /// The host calls this every `merge_animation_interval` after
    /// [`Request::StartMergeAnimation`] until it returns
    /// [`AnimationStatus::Finished`].
    pub fn advance_animation(&mut self, view: &dyn RegionBuilder) -> AnimationStatus {
        let Some(animation) = self.animation.as_mut() else {
            return AnimationStatus::Idle;
        };

        let (a, b) = animation.advance();
        let (first, second) = (animation.first, animation.second);
        if animation.is_finished() {
            if let Some(animation) = self.animation.take() {
                self.commit_merge(&animation, view);
            }
            return AnimationStatus::Finished;
        }

        let r = self.config.highlighted_node_radius;
        self.line.set_coord(first, a, view.ellipse_region(&a, r, r));
        self.line.set_coord(second, b, view.ellipse_region(&b, r, r));
        self.refresh_line_region(view);
        AnimationStatus::Running
    }

    fn node_region(&self, coord: &Coordinate, view: &dyn RegionBuilder) -> Region {
        let r = self.config.node_hit_radius;
        view.ellipse_region(coord, r, r)
    }

    fn virtual_node_at(&self, point: Point) -> Option<usize> {
        self.virtual_nodes
            .iter()
            .position(|v| v.region.contains(point))
    }

    fn refresh_line_region(&mut self, view: &dyn RegionBuilder) {
        let width = self.config.polyline_hit_width;
        self.line_region = match (self.closed, self.line.coords().first()) {
            (true, Some(&first)) => {
                let mut ring = self.line.coords().to_vec();
                ring.push(first);
                view.polyline_region(&ring, width)
            }
            _ => view.polyline_region(self.line.coords(), width),
        };
    }

    /// Midpoints of every segment, inserted at the later index, plus the
    /// midpoint between the last and first node, appended at the end.
    fn build_virtual_nodes(&self, view: &dyn RegionBuilder) -> Vec<VirtualNode> {
        let coords = self.line.coords();
        let n = coords.len();
        if n < 2 {
            return Vec::new();
        }

        let r = self.config.virtual_node_hit_radius;
        let make = |a: &Coordinate, b: &Coordinate, insert_at: usize| {
            let coord = a.interpolate(b, 0.5);
            VirtualNode {
                insert_at,
                coord,
                region: view.ellipse_region(&coord, r, r),
                hovered: false,
            }
        };

        let mut nodes: Vec<VirtualNode> =
            (1..n).map(|i| make(&coords[i - 1], &coords[i], i)).collect();
        if n >= MIN_NODES {
            nodes.push(make(&coords[n - 1], &coords[0], n));
        }
        nodes
    }

    fn fix_refs(&mut self, f: impl Fn(usize) -> Option<usize>) {
        self.clicked = self.clicked.and_then(&f);
        self.hovered = self.hovered.and_then(&f);
        self.pending = match self.pending {
            Some(Pending::NodeDrag { node, press }) => {
                f(node).map(|node| Pending::NodeDrag { node, press })
            }
            Some(Pending::MergeFirst(node)) => f(node).map(Pending::MergeFirst),
            Some(Pending::Adjusting(node)) => f(node).map(Pending::Adjusting),
            None => None,
        };
    }

    fn remove_node(&mut self, index: usize) -> Option<Coordinate> {
        let (coord, _) = self.line.remove(index)?;
        self.fix_refs(|i| shift_after_removal(i, index));
        Some(coord)
    }

    fn insert_node(&mut self, index: usize, coord: Coordinate, node: Node) {
        self.line.insert(index, coord, node);
        self.fix_refs(|i| Some(shift_after_insertion(i, index)));
    }

    fn clear_hover(&mut self) {
        if let Some(n) = self.hovered.take().and_then(|i| self.line.node_mut(i)) {
            n.set_flag(NodeFlags::HOVERED, false);
        }
        for v in &mut self.virtual_nodes {
            v.hovered = false;
        }
    }

    fn update_hover(&mut self, point: Point, flag: NodeFlags) -> bool {
        let hit = self.line.hit(point);
        if hit == self.hovered {
            return hit.is_some();
        }

        self.clear_hover();
        if let Some(n) = hit.and_then(|i| self.line.node_mut(i)) {
            n.set_flag(flag, true);
        }
        self.hovered = hit;
        hit.is_some()
    }

    fn move_node(&mut self, index: usize, point: Point, view: &dyn RegionBuilder) {
        let Some(coord) = view.screen_to_geographic(point) else {
            return;
        };
        let region = self.node_region(&coord, view);
        self.line.set_coord(index, coord, region);
        self.refresh_line_region(view);
    }

    /// Finish a merge: drop the first node, park the second on the midpoint.
    fn commit_merge(&mut self, animation: &MergeAnimation, view: &dyn RegionBuilder) {
        self.clear_hover();
        let selected = [animation.first, animation.second]
            .iter()
            .any(|&i| self.line.node(i).is_some_and(Node::is_selected));

        self.remove_node(animation.first);
        if let Some(survivor) = shift_after_removal(animation.second, animation.first) {
            let target = animation.target();
            let region = self.node_region(&target, view);
            self.line.set_coord(survivor, target, region);
            if let Some(n) = self.line.node_mut(survivor) {
                n.set_flag(NodeFlags::SELECTED, selected);
            }
        }
        self.line.clear_flags(NodeFlags::MERGED);
        self.refresh_line_region(view);
        log::debug!(
            "merged node {} into {} on polyline {}",
            animation.first,
            animation.second,
            self.id
        );
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
        self.line.push(coord, Node::new(region));
        self.refresh_line_region(view);
        true
    }

    fn drawing_release(&mut self, _: Point, button: MouseButton, _: &dyn RegionBuilder) -> bool {
        button == MouseButton::Left
    }

    // --- Editing ---

    fn editing_press(&mut self, point: Point, button: MouseButton, _: &dyn RegionBuilder) -> bool {
        if let Some(node) = self.line.hit(point) {
            if button == MouseButton::Left {
                self.pending = Some(Pending::NodeDrag {
                    node,
                    press: PressTracker::new(point),
                });
            } else {
                self.clicked = Some(node);
                self.request = Some(Request::ShowNodeMenu);
            }
            return true;
        }

        if !self.line_region.contains(point) {
            return false;
        }
        if button == MouseButton::Right {
            self.clicked = None;
            self.request = Some(Request::ShowPolylineMenu);
        }
        true
    }

    fn editing_move(&mut self, point: Point, view: &dyn RegionBuilder) -> bool {
        match self.pending {
            Some(Pending::NodeDrag { node, .. }) => {
                self.move_node(node, point, view);
                if let Some(Pending::NodeDrag { press, .. }) = &mut self.pending {
                    press.update(point);
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
        let Some(Pending::NodeDrag { node, press }) = self.pending else {
            return false;
        };

        self.pending = None;
        if press.is_click(point, self.config.click_tolerance) {
            if let Some(n) = self.line.node_mut(node) {
                let selected = n.is_selected();
                n.set_flag(NodeFlags::SELECTED, !selected);
            }
        }
        true
    }

    // --- MergingNodes ---

    fn merging_press(&mut self, point: Point, button: MouseButton, _: &dyn RegionBuilder) -> bool {
        if button != MouseButton::Left {
            return false;
        }
        let Some(node) = self.line.hit(point) else {
            return false;
        };

        let Some(Pending::MergeFirst(first)) = self.pending else {
            if let Some(n) = self.line.node_mut(node) {
                n.set_flag(NodeFlags::MERGED, true);
            }
            self.pending = Some(Pending::MergeFirst(node));
            return true;
        };

        self.pending = None;
        if first == node {
            if let Some(n) = self.line.node_mut(node) {
                n.set_flag(NodeFlags::MERGED, false);
            }
            return true;
        }

        if self.line.len() <= MIN_NODES {
            self.line.clear_flags(NodeFlags::MERGED);
            log::debug!("merge collapses polyline {}", self.id);
            self.request = Some(Request::RemoveShape);
            return true;
        }

        let (Some(&a), Some(&b)) = (self.line.coord(first), self.line.coord(node)) else {
            return true;
        };
        if let Some(n) = self.line.node_mut(node) {
            n.set_flag(NodeFlags::MERGED, true);
        }
        self.animation = Some(MergeAnimation::new(
            first,
            node,
            a,
            b,
            self.config.merge_animation_steps,
        ));
        log::debug!("polyline {} animating merge of {} and {}", self.id, first, node);
        self.request = Some(Request::StartMergeAnimation);
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
        button == MouseButton::Left && self.line.hit(point).is_some()
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

        if let Some(Pending::Adjusting(node)) = self.pending {
            self.pending = None;
            log::debug!("fixed node {} on polyline {}", node, self.id);
            return true;
        }

        // Real nodes shadow the virtual nodes of short segments.
        if let Some(node) = self.line.hit(point) {
            log::trace!("press on node {} of polyline {} inserts nothing", node, self.id);
            return true;
        }

        let Some(virtual_node) = self
            .virtual_node_at(point)
            .and_then(|i| self.virtual_nodes.get(i).cloned())
        else {
            return false;
        };

        let index = virtual_node.insert_at;
        let region = self.node_region(&virtual_node.coord, view);
        self.insert_node(index, virtual_node.coord, Node::new(region));
        log::debug!("promoted virtual node to {} on polyline {}", index, self.id);

        self.pending = Some(Pending::Adjusting(index));
        self.refresh_line_region(view);
        self.virtual_nodes = self.build_virtual_nodes(view);
        true
    }

    fn adding_move(&mut self, point: Point, view: &dyn RegionBuilder) -> bool {
        if let Some(Pending::Adjusting(node)) = self.pending {
            self.move_node(node, point, view);
            self.virtual_nodes = self.build_virtual_nodes(view);
            return true;
        }

        let hit = match self.line.hit(point) {
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
                || self.line.hit(point).is_some()
                || self.virtual_node_at(point).is_some())
    }

    // --- state hooks ---

    fn leave_state(&mut self) {
        self.clear_hover();
        match self.state {
            PolylineState::DrawingNew => {
                if self.line.len() < MIN_NODES {
                    log::debug!("polyline {} left drawing with {} nodes", self.id, self.line.len());
                    self.request = Some(Request::RemoveShape);
                }
            }
            PolylineState::Editing => self.clicked = None,
            PolylineState::MergingNodes => self.line.clear_flags(NodeFlags::MERGED),
            PolylineState::AddingNodes => self.virtual_nodes.clear(),
        }
        self.pending = None;
    }

    fn require_editing(&self) -> EditResult<()> {
        if self.is_busy() {
            return Err(EditError::Busy);
        }
        if self.state != PolylineState::Editing {
            return Err(EditError::WrongState {
                expected: ActionState::Editing,
                actual: self.state.into(),
            });
        }
        Ok(())
    }

    fn delete_nodes(
        &mut self,
        mut doomed: Vec<usize>,
        view: &dyn RegionBuilder,
    ) -> EditResult<DeleteOutcome> {
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        doomed.dedup();
        if doomed.is_empty() {
            return Ok(DeleteOutcome::Removed(0));
        }

        if self.line.len().saturating_sub(doomed.len()) < MIN_NODES {
            log::debug!("deleting {} nodes removes polyline {}", doomed.len(), self.id);
            self.request = Some(Request::RemoveShape);
            return Ok(DeleteOutcome::ShapeRemoved);
        }

        for &index in &doomed {
            self.remove_node(index);
        }
        self.refresh_line_region(view);
        Ok(DeleteOutcome::Removed(doomed.len()))
    }
}

impl EditableShape for PolylineEditor {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn state(&self) -> ActionState {
        self.state.into()
    }

    fn is_busy(&self) -> bool {
        self.animation.is_some()
    }

    fn handle_event(&mut self, event: &PointerEvent, view: &dyn RegionBuilder) -> bool {
        if self.is_busy() {
            log::trace!("polyline {} busy, ignoring {:?}", self.id, event);
            return false;
        }

        self.request = None;
        let handled = self.state.handlers().dispatch(self, event, view);
        log::trace!("polyline {} {:?} in {:?}: {}", self.id, event, self.state, handled);
        handled
    }

    fn contains_point(&self, point: Point) -> bool {
        match self.state {
            PolylineState::Editing => {
                self.line.hit(point).is_some() || self.line_region.contains(point)
            }
            PolylineState::DrawingNew => true,
            PolylineState::MergingNodes => self.line.hit(point).is_some(),
            PolylineState::AddingNodes => {
                self.virtual_node_at(point).is_some()
                    || self.line.hit(point).is_some()
                    || self.line_region.contains(point)
            }
        }
    }

    fn set_state(
        &mut self,
        state: ActionState,
        view: &dyn RegionBuilder,
    ) -> EditResult<Option<StateChange>> {
        if self.is_busy() {
            return Err(EditError::Busy);
        }
        let next = PolylineState::try_from(state)?;
        if next == self.state {
            return Ok(None);
        }

        let previous = self.state;
        self.leave_state();
        self.state = next;
        if next == PolylineState::AddingNodes {
            self.virtual_nodes = self.build_virtual_nodes(view);
        }
        log::debug!("polyline {} state {:?} -> {:?}", self.id, previous, next);

        Ok(Some(StateChange {
            id: self.id,
            previous: previous.into(),
            current: next.into(),
        }))
    }

    fn notify_other_item_changed(&mut self, _: &dyn RegionBuilder) {
        self.clear_hover();
    }

    fn refresh_regions(&mut self, view: &dyn RegionBuilder) {
        self.line.rebuild_regions(view, self.config.node_hit_radius);
        self.refresh_line_region(view);

        if self.state == PolylineState::AddingNodes {
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
        let doomed = self.line.selected();
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
        let n = self.line.node_mut(node).ok_or(EditError::NoClickedNode)?;
        let selected = !n.is_selected();
        n.set_flag(NodeFlags::SELECTED, selected);
        Ok(selected)
    }

    fn clicked_node_is_selected(&self) -> Option<bool> {
        self.clicked
            .and_then(|i| self.line.node(i))
            .map(Node::is_selected)
    }

    fn has_nodes_selected(&self) -> bool {
        self.line.nodes().iter().any(Node::is_selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{MapViewport, Viewport};
    use kurbo::Vec2;

    fn view() -> MapViewport {
        MapViewport::new(Vec2::new(0.0, 1000.0), 100.0)
    }

    fn at(lon: f64, lat: f64) -> Point {
        screen(&Coordinate::from_degrees(lon, lat))
    }

    fn screen(coord: &Coordinate) -> Point {
        view().geographic_to_screen(coord).unwrap()
    }

    fn line(points: &[(f64, f64)]) -> LineString {
        LineString::from(
            points
                .iter()
                .map(|&(lon, lat)| Coordinate::from_degrees(lon, lat))
                .collect::<Vec<_>>(),
        )
    }

    fn straight() -> PolylineEditor {
        crate::editor::init_test_logging();
        PolylineEditor::new(
            line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]),
            &view(),
        )
    }

    fn send(editor: &mut PolylineEditor, event: PointerEvent) -> bool {
        editor.handle_event(&event, &view())
    }

    fn press(editor: &mut PolylineEditor, point: Point, button: MouseButton) -> bool {
        send(editor, PointerEvent::press(point, button))
    }

    fn release(editor: &mut PolylineEditor, point: Point, button: MouseButton) -> bool {
        send(editor, PointerEvent::release(point, button))
    }

    fn click(editor: &mut PolylineEditor, point: Point) -> Option<Request> {
        send(editor, PointerEvent::press(point, MouseButton::Left));
        let request = editor.request();
        send(editor, PointerEvent::release(point, MouseButton::Left));
        request
    }

    fn set(editor: &mut PolylineEditor, state: ActionState) {
        editor.set_state(state, &view()).unwrap();
    }

    #[test]
    fn test_line_body_is_pass_through() {
        let mut editor = straight();
        let body = at(1.5, 0.0);
        let geometry = editor.geometry();

        assert!(press(&mut editor, body, MouseButton::Right));
        assert_eq!(editor.request(), Some(Request::ShowPolylineMenu));

        assert!(press(&mut editor, body, MouseButton::Left));
        send(&mut editor, PointerEvent::moved(at(1.5, 1.0)));
        release(&mut editor, at(1.5, 1.0), MouseButton::Left);
        assert_eq!(editor.geometry(), geometry);

        assert!(!press(&mut editor, at(1.5, 0.5), MouseButton::Left));
        assert!(!editor.contains_point(at(1.5, 0.5)));
    }

    #[test]
    fn test_node_drag_and_click() {
        let mut editor = straight();
        press(&mut editor, at(1.0, 0.0), MouseButton::Left);
        send(&mut editor, PointerEvent::moved(at(1.0, 1.0)));
        release(&mut editor, at(1.0, 1.0), MouseButton::Left);
        let moved = editor.nodes().coord(1).unwrap();
        assert!((moved.lat_degrees() - 1.0).abs() < 1e-9);
        assert!(!editor.has_nodes_selected());

        click(&mut editor, at(1.0, 1.0));
        assert_eq!(editor.selected_nodes(), vec![1]);
    }

    #[test]
    fn test_right_press_on_node_opens_menu() {
        let mut editor = straight();
        assert!(press(&mut editor, at(2.0, 0.0), MouseButton::Right));
        assert_eq!(editor.request(), Some(Request::ShowNodeMenu));
        assert_eq!(editor.clicked_node(), Some(2));
        assert_eq!(editor.toggle_clicked_node_selection(), Ok(true));
        assert_eq!(editor.clicked_node_is_selected(), Some(true));
    }

    #[test]
    fn test_merge_runs_as_animation() {
        let mut editor = straight();
        set(&mut editor, ActionState::MergingNodes);

        assert_eq!(click(&mut editor, at(1.0, 0.0)), None);
        assert_eq!(editor.merge_candidate(), Some(1));
        assert_eq!(
            click(&mut editor, at(2.0, 0.0)),
            Some(Request::StartMergeAnimation)
        );
        assert!(editor.is_busy());
        assert!(editor.nodes().node(2).unwrap().is_being_merged());

        assert!(!press(&mut editor, at(0.0, 0.0), MouseButton::Left));
        assert_eq!(
            editor.set_state(ActionState::Editing, &view()),
            Err(EditError::Busy)
        );

        let steps = editor.config().merge_animation_steps;
        let mut ran = 0;
        loop {
            ran += 1;
            match editor.advance_animation(&view()) {
                AnimationStatus::Running => {
                    let first = editor.nodes().coord(1).unwrap().lon_degrees();
                    assert!(first > 1.0 && first < 1.5);
                }
                AnimationStatus::Finished => break,
                AnimationStatus::Idle => panic!("animation stopped early"),
            }
        }
        assert_eq!(ran, steps);

        assert!(!editor.is_busy());
        assert_eq!(editor.nodes().len(), 3);
        let merged = editor.nodes().coord(1).unwrap();
        assert!((merged.lon_degrees() - 1.5).abs() < 1e-9);
        assert!(merged.lat_degrees().abs() < 1e-9);
        assert!(editor.nodes().nodes().iter().all(|n| !n.is_being_merged()));
        assert!(editor.nodes().node(1).unwrap().contains_point(at(1.5, 0.0)));
        assert_eq!(editor.advance_animation(&view()), AnimationStatus::Idle);
    }

    #[test]
    fn test_merge_keeps_selection() {
        let mut editor = straight();
        click(&mut editor, at(3.0, 0.0));
        set(&mut editor, ActionState::MergingNodes);
        click(&mut editor, at(3.0, 0.0));
        click(&mut editor, at(0.0, 0.0));
        while editor.advance_animation(&view()) == AnimationStatus::Running {}
        assert_eq!(editor.selected_nodes(), vec![0]);
    }

    #[test]
    fn test_merge_on_three_nodes_requests_removal() {
        let mut editor = PolylineEditor::new(line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]), &view());
        set(&mut editor, ActionState::MergingNodes);
        click(&mut editor, at(0.0, 0.0));
        assert_eq!(click(&mut editor, at(1.0, 0.0)), Some(Request::RemoveShape));
        assert!(!editor.is_busy());
        assert_eq!(editor.nodes().len(), 3);
        assert!(editor.nodes().nodes().iter().all(|n| !n.is_being_merged()));
    }

    #[test]
    fn test_virtual_nodes_include_wraparound() {
        let mut editor = PolylineEditor::new(
            line(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (4.0, 3.0)]),
            &view(),
        );
        set(&mut editor, ActionState::AddingNodes);
        let inserts: Vec<usize> = editor.virtual_nodes().iter().map(|v| v.insert_at).collect();
        assert_eq!(inserts, vec![1, 2, 3, 4]);

        let wrap = editor.virtual_nodes()[3].coord;
        assert!(click(&mut editor, screen(&wrap)).is_none());
        assert_eq!(editor.nodes().len(), 5);
        assert_eq!(editor.adjusting_node(), Some(4));
        assert!(editor.nodes().coord(4).unwrap().approx_eq(&wrap, 1e-12));
    }

    #[test]
    fn test_promote_and_adjust() {
        let mut editor = straight();
        click(&mut editor, at(2.0, 0.0));
        set(&mut editor, ActionState::AddingNodes);

        assert!(send(&mut editor, PointerEvent::moved(at(0.5, 0.0))));
        assert!(editor.virtual_nodes()[0].hovered);

        click(&mut editor, at(0.5, 0.0));
        assert_eq!(editor.nodes().len(), 5);
        assert_eq!(editor.adjusting_node(), Some(1));
        assert_eq!(editor.selected_nodes(), vec![3]);

        send(&mut editor, PointerEvent::moved(at(0.5, 1.0)));
        assert!((editor.nodes().coord(1).unwrap().lat_degrees() - 1.0).abs() < 1e-9);

        click(&mut editor, at(0.5, 1.0));
        assert_eq!(editor.adjusting_node(), None);
    }

    #[test]
    fn test_real_node_shadows_virtual_node() {
        crate::editor::init_test_logging();
        let short = line(&[(0.0, 0.0), (0.1, 0.0), (0.2, 0.0)]);
        let mut editor = PolylineEditor::new(short, &view());
        set(&mut editor, ActionState::AddingNodes);
        let node = at(0.1, 0.0);
        assert!(editor.virtual_nodes().iter().any(|v| v.region.contains(node)));

        assert!(!send(&mut editor, PointerEvent::moved(node)));
        assert!(editor.virtual_nodes().iter().all(|v| !v.hovered));

        assert_eq!(click(&mut editor, node), None);
        assert_eq!(editor.nodes().len(), 3);
        assert_eq!(editor.adjusting_node(), None);
    }

    #[test]
    fn test_drawing_leaves_short_line_for_removal() {
        let mut editor = PolylineEditor::drawing(EditorConfig::polyline(), &view());
        click(&mut editor, at(0.0, 0.0));
        click(&mut editor, at(1.0, 0.0));
        set(&mut editor, ActionState::Editing);
        assert_eq!(editor.request(), Some(Request::RemoveShape));
        assert_eq!(editor.geometry().len(), 2);
    }

    #[test]
    fn test_delete_nodes() {
        let mut editor = straight();
        click(&mut editor, at(1.0, 0.0));
        assert_eq!(
            editor.delete_selected_nodes(&view()),
            Ok(DeleteOutcome::Removed(1))
        );
        assert_eq!(editor.nodes().len(), 3);

        click(&mut editor, at(0.0, 0.0));
        click(&mut editor, at(3.0, 0.0));
        let before = editor.geometry();
        assert_eq!(
            editor.delete_selected_nodes(&view()),
            Ok(DeleteOutcome::ShapeRemoved)
        );
        assert_eq!(editor.request(), Some(Request::RemoveShape));
        assert_eq!(editor.geometry(), before);
    }

    #[test]
    fn test_clicked_index_follows_deletion() {
        let mut editor = straight();
        click(&mut editor, at(0.0, 0.0));
        press(&mut editor, at(3.0, 0.0), MouseButton::Right);
        editor.delete_selected_nodes(&view()).unwrap();
        assert_eq!(editor.clicked_node(), Some(2));
        assert_eq!(
            editor.delete_clicked_node(&view()),
            Ok(DeleteOutcome::ShapeRemoved)
        );
    }

    #[test]
    fn test_adding_hole_is_unsupported() {
        let mut editor = straight();
        assert_eq!(
            editor.set_state(ActionState::AddingHole, &view()),
            Err(EditError::UnsupportedState(ActionState::AddingHole))
        );
        assert_eq!(editor.state(), ActionState::Editing);
    }

    #[test]
    fn test_closed_line_hits_closing_segment() {
        let mut geometry = line(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]);
        geometry.closed = true;
        let editor = PolylineEditor::new(geometry, &view());
        assert!(editor.contains_point(at(1.0, 1.0)));
        assert!(editor.geometry().closed);
    }
}
