//! Errors returned by explicit editing operations.

use crate::editor::ActionState;
use thiserror::Error;

/// Reasons an explicit editing operation was refused.
///
/// Pointer handlers never return these; they report "not handled" instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("the edit would leave a hole outside the outer boundary; it was rolled back")]
    InvalidShape,
    #[error("operation requires the {expected:?} state, item is in {actual:?}")]
    WrongState {
        expected: ActionState,
        actual: ActionState,
    },
    #[error("no node was right-clicked")]
    NoClickedNode,
    #[error("a merge animation is still running")]
    Busy,
    #[error("state {0:?} is not supported by this shape")]
    UnsupportedState(ActionState),
}

/// Result type for editing operations.
pub type EditResult<T> = Result<T, EditError>;
