//! Editor configuration: hit-test sizes, timings and node colors.

use crate::node::NodeAppearance;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Node fill colors, one per [`NodeAppearance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePalette {
    pub regular: SerializableColor,
    pub selected: SerializableColor,
    pub merged: SerializableColor,
    pub hovered: SerializableColor,
    /// Fill of a hovered virtual node.
    pub virtual_hovered: SerializableColor,
}

impl Default for NodePalette {
    fn default() -> Self {
        Self {
            regular: SerializableColor::new(0xba, 0xb9, 0xb6, 0xff),
            selected: SerializableColor::new(0x55, 0x57, 0x53, 0xff),
            merged: SerializableColor::new(0x00, 0x79, 0x30, 0xff),
            hovered: SerializableColor::new(0x00, 0xff, 0xff, 0x78),
            virtual_hovered: SerializableColor::new(0x5b, 0x2b, 0x8c, 0xff),
        }
    }
}

impl NodePalette {
    pub fn color(&self, appearance: NodeAppearance) -> Color {
        match appearance {
            NodeAppearance::Plain => self.regular.into(),
            NodeAppearance::Hovered => self.hovered.into(),
            NodeAppearance::Selected => self.selected.into(),
            NodeAppearance::Merged => self.merged.into(),
        }
    }
}

/// Tunables shared by the polygon and polyline editors.
///
/// All sizes are in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Hit radius of a real node.
    pub node_hit_radius: f64,
    /// Hit radius of a virtual node.
    pub virtual_node_hit_radius: f64,
    /// Drawn radius of a plain or selected node.
    pub node_radius: f64,
    /// Drawn radius of a node being merged or hovered.
    pub highlighted_node_radius: f64,
    /// Width of the clickable band around a polyline.
    pub polyline_hit_width: f64,
    /// Per-axis movement up to which a press+release counts as a click.
    pub click_tolerance: f64,
    /// Number of interpolation steps of a polyline merge.
    pub merge_animation_steps: u32,
    /// Delay between two merge animation steps, in milliseconds.
    pub merge_animation_interval_ms: u64,
    #[serde(default)]
    pub palette: NodePalette,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            node_hit_radius: 7.5,
            virtual_node_hit_radius: 7.5,
            node_radius: 5.0,
            highlighted_node_radius: 7.5,
            polyline_hit_width: 5.0,
            click_tolerance: 1.0,
            merge_animation_steps: 20,
            merge_animation_interval_ms: 10,
            palette: NodePalette::default(),
        }
    }
}

impl EditorConfig {
    /// Settings matching the larger polyline handles.
    pub fn polyline() -> Self {
        Self {
            node_hit_radius: 7.5,
            virtual_node_hit_radius: 10.0,
            node_radius: 5.0,
            highlighted_node_radius: 10.0,
            ..Self::default()
        }
    }

    pub fn merge_animation_interval(&self) -> Duration {
        Duration::from_millis(self.merge_animation_interval_ms)
    }

    /// Drawn radius for a node appearance.
    pub fn display_radius(&self, appearance: NodeAppearance) -> f64 {
        match appearance {
            NodeAppearance::Plain | NodeAppearance::Selected => self.node_radius,
            NodeAppearance::Hovered | NodeAppearance::Merged => self.highlighted_node_radius,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
