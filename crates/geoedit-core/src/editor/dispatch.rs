//! Per-state pointer handler tables.

use crate::input::{MouseButton, PointerEvent};
use crate::region::RegionBuilder;
use kurbo::Point;

pub(crate) type ButtonHandler<E> = fn(&mut E, Point, MouseButton, &dyn RegionBuilder) -> bool;
pub(crate) type MoveHandler<E> = fn(&mut E, Point, &dyn RegionBuilder) -> bool;

/// The three handlers that serve one (shape kind, state) pair.
pub(crate) struct HandlerSet<E> {
    pub press: ButtonHandler<E>,
    pub moved: MoveHandler<E>,
    pub release: ButtonHandler<E>,
}

impl<E> HandlerSet<E> {
    /// Route an event to the matching handler.
    ///
    /// Middle-button and scroll events are never consumed.
    pub fn dispatch(
        &self,
        editor: &mut E,
        event: &PointerEvent,
        view: &dyn RegionBuilder,
    ) -> bool {
        match *event {
            PointerEvent::Down { position, button } if button != MouseButton::Middle => {
                (self.press)(editor, position, button, view)
            }
            PointerEvent::Up { position, button } if button != MouseButton::Middle => {
                (self.release)(editor, position, button, view)
            }
            PointerEvent::Move { position } => (self.moved)(editor, position, view),
            _ => false,
        }
    }
}

/// Move handler for states that only react to presses.
pub(crate) fn ignore_move<E>(_: &mut E, _: Point, _: &dyn RegionBuilder) -> bool {
    false
}
