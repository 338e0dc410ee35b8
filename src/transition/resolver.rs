//! The hook surface a transition strategy drives.

use crate::error::TaskError;
use crate::task::BoxRoutine;

/// Per-transition operations, implemented by the navigation tree for one
/// in-flight transition. A [`Transition`](super::Transition) decides the
/// order in which they run.
pub trait TransitionResolver {
    /// Record the transition as started: unfocus the old path and begin
    /// effects.
    fn start(&self) -> Result<(), TaskError>;

    fn enter_effect_routine(&self) -> BoxRoutine;

    /// Load then initialize every node being opened.
    fn load_next_routine(&self) -> BoxRoutine;

    fn activate_next(&self) -> Result<(), TaskError>;

    fn open_next_routine(&self, immediate: bool) -> BoxRoutine;

    fn close_prev_routine(&self, immediate: bool) -> BoxRoutine;

    fn deactivate_prev(&self) -> Result<(), TaskError>;

    fn unload_prev(&self) -> Result<(), TaskError>;

    fn exit_effect_routine(&self) -> BoxRoutine;

    /// End effects, focus the new top node and mark the transition complete.
    fn finish(&self) -> Result<(), TaskError>;
}
