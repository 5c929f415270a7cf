//! Per-node hit regions and interaction flags.
//!
//! Geometry and node bookkeeping live side by side in [`NodeSeq`]: two
//! vectors of equal length indexed by the same integer. Every insertion and
//! removal goes through `NodeSeq`, so the two never drift apart.

use crate::geo::Coordinate;
use crate::region::Region;
use bitflags::bitflags;
use kurbo::Point;

bitflags! {
    /// Independent interaction flags of a node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Part of the user's node selection.
        const SELECTED         = 0b0000_0001;
        /// Picked as one side of a pending merge.
        const MERGED           = 0b0000_0010;
        /// Hovered while in the editing state.
        const EDITING_HOVERED  = 0b0000_0100;
        /// Hovered while in the merging state.
        const MERGING_HOVERED  = 0b0000_1000;
        /// Belongs to a hole that is still being drawn.
        const TEMPORARY_HOLE   = 0b0001_0000;
    }
}

impl NodeFlags {
    /// Either hover variant.
    pub const HOVERED: NodeFlags = NodeFlags::EDITING_HOVERED.union(NodeFlags::MERGING_HOVERED);
}

/// How a node should be drawn when several flags are set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAppearance {
    Plain,
    Hovered,
    Selected,
    Merged,
}

/// One vertex as seen by the editor: a hit region plus flags.
///
/// Equality compares region and flags, not identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    region: Region,
    flags: NodeFlags,
}

impl Node {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            flags: NodeFlags::empty(),
        }
    }

    pub fn with_flags(region: Region, flags: NodeFlags) -> Self {
        Self { region, flags }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn set_flag(&mut self, flag: NodeFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.region.contains(point)
    }

    pub fn is_selected(&self) -> bool {
        self.flags.contains(NodeFlags::SELECTED)
    }

    pub fn is_being_merged(&self) -> bool {
        self.flags.contains(NodeFlags::MERGED)
    }

    pub fn is_editing_hovered(&self) -> bool {
        self.flags.contains(NodeFlags::EDITING_HOVERED)
    }

    pub fn is_merging_hovered(&self) -> bool {
        self.flags.contains(NodeFlags::MERGING_HOVERED)
    }

    pub fn is_temporary_hole(&self) -> bool {
        self.flags.contains(NodeFlags::TEMPORARY_HOLE)
    }

    /// Resolve the flag set to a single appearance: merged beats selected
    /// beats hovered.
    pub fn appearance(&self) -> NodeAppearance {
        if self.is_being_merged() {
            NodeAppearance::Merged
        } else if self.is_selected() {
            NodeAppearance::Selected
        } else if self.flags.intersects(NodeFlags::HOVERED) {
            NodeAppearance::Hovered
        } else {
            NodeAppearance::Plain
        }
    }
}

/// An insertion candidate at the midpoint of two adjacent nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualNode {
    /// Index the promoted node will occupy.
    pub insert_at: usize,
    /// Midpoint coordinate.
    pub coord: Coordinate,
    pub region: Region,
    pub hovered: bool,
}

/// Coordinates of one ring or line together with their nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSeq {
    coords: Vec<Coordinate>,
    nodes: Vec<Node>,
}

impl NodeSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing coordinates with plain nodes. Regions are empty until
    /// the owner refreshes them.
    pub fn from_coords(coords: Vec<Coordinate>) -> Self {
        let nodes = vec![Node::default(); coords.len()];
        Self { coords, nodes }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn coord(&self, index: usize) -> Option<&Coordinate> {
        self.coords.get(index)
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn push(&mut self, coord: Coordinate, node: Node) {
        self.coords.push(coord);
        self.nodes.push(node);
    }

    /// Insert a coordinate and its node at `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, coord: Coordinate, node: Node) {
        let index = index.min(self.coords.len());
        self.coords.insert(index, coord);
        self.nodes.insert(index, node);
    }

    /// Remove the coordinate and node at `index`.
    pub fn remove(&mut self, index: usize) -> Option<(Coordinate, Node)> {
        if index >= self.coords.len() {
            return None;
        }
        Some((self.coords.remove(index), self.nodes.remove(index)))
    }

    /// Overwrite a coordinate and its region together.
    pub fn set_coord(&mut self, index: usize, coord: Coordinate, region: Region) {
        if let (Some(c), Some(n)) = (self.coords.get_mut(index), self.nodes.get_mut(index)) {
            *c = coord;
            n.set_region(region);
        }
    }

    /// Index of the first node whose region contains `point`.
    pub fn hit(&self, point: Point) -> Option<usize> {
        self.nodes.iter().position(|n| n.contains_point(point))
    }

    /// Indices of the selected nodes, ascending.
    pub fn selected(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_selected())
            .map(|(i, _)| i)
            .collect()
    }

    /// Clear `flags` on every node.
    pub fn clear_flags(&mut self, flags: NodeFlags) {
        for node in &mut self.nodes {
            node.set_flag(flags, false);
        }
    }

    /// Rebuild every node region; `radius` is the hit radius in pixels.
    pub fn rebuild_regions(&mut self, regions: &dyn crate::region::RegionBuilder, radius: f64) {
        for (coord, node) in self.coords.iter().zip(self.nodes.iter_mut()) {
            node.set_region(regions.ellipse_region(coord, radius, radius));
        }
    }

    /// Iterate over (coordinate, node) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Coordinate, &Node)> {
        self.coords.iter().zip(self.nodes.iter())
    }

    pub fn into_coords(self) -> Vec<Coordinate> {
        self.coords
    }
}

/// Adjust a stored index after the element at `removed` was taken out.
///
/// Returns `None` when the stored index pointed at the removed element.
pub fn shift_after_removal(index: usize, removed: usize) -> Option<usize> {
    match index.cmp(&removed) {
        std::cmp::Ordering::Less => Some(index),
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(index - 1),
    }
}

/// Adjust a stored index after an element was inserted at `inserted`.
pub fn shift_after_insertion(index: usize, inserted: usize) -> usize {
    if index >= inserted { index + 1 } else { index }
}
