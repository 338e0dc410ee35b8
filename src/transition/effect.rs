//! Visual effects that wrap a transition.

use crate::task::{routine, BoxRoutine};
use std::rc::Rc;

/// A visual effect played around a transition, such as a fade.
///
/// `begin_transition` and `end_transition` bracket the whole transition. The
/// enter routine runs before the old nodes close, the exit routine after the
/// new nodes open.
pub trait TransitionEffect {
    fn begin_transition(&self) {}

    fn enter_routine(&self) -> BoxRoutine {
        routine::done()
    }

    fn exit_routine(&self) -> BoxRoutine {
        routine::done()
    }

    fn end_transition(&self) {}
}

pub type EffectRef = Rc<dyn TransitionEffect>;

/// An effect that holds for a fixed number of ticks on each side.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelayEffect {
    pub enter_ticks: usize,
    pub exit_ticks: usize,
}

impl DelayEffect {
    pub fn new(enter_ticks: usize, exit_ticks: usize) -> Self {
        Self {
            enter_ticks,
            exit_ticks,
        }
    }
}

impl TransitionEffect for DelayEffect {
    fn enter_routine(&self) -> BoxRoutine {
        routine::ticks(self.enter_ticks)
    }

    fn exit_routine(&self) -> BoxRoutine {
        routine::ticks(self.exit_ticks)
    }
}
