//! Pointer events forwarded by the host.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    /// Screen position of the event.
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }

    /// Button of a press or release.
    pub fn button(&self) -> Option<MouseButton> {
        match self {
            PointerEvent::Down { button, .. } | PointerEvent::Up { button, .. } => Some(*button),
            _ => None,
        }
    }

    pub fn press(position: Point, button: MouseButton) -> Self {
        PointerEvent::Down { position, button }
    }

    pub fn release(position: Point, button: MouseButton) -> Self {
        PointerEvent::Up { position, button }
    }

    pub fn moved(position: Point) -> Self {
        PointerEvent::Move { position }
    }
}

/// Remembers where a press started so the release can tell a click from a
/// drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressTracker {
    /// Screen position of the press.
    pub start: Point,
    /// Latest pointer position.
    pub current: Point,
}

impl PressTracker {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            current: start,
        }
    }

    pub fn update(&mut self, position: Point) {
        self.current = position;
    }

    /// Displacement from the press to `position`.
    pub fn delta(&self, position: Point) -> Vec2 {
        position - self.start
    }

    /// The pointer stayed within `tolerance` pixels on both axes.
    pub fn is_click(&self, position: Point, tolerance: f64) -> bool {
        let d = self.delta(position);
        d.x.abs() <= tolerance && d.y.abs() <= tolerance
    }
}
