//! Step-by-step scripts built from closures.

use super::{BoxRoutine, Routine, Yield};
use crate::error::TaskError;
use std::collections::VecDeque;

enum Instruction {
    Call(Box<dyn FnOnce() -> Result<(), TaskError>>),
    Run(Box<dyn FnOnce() -> BoxRoutine>),
}

/// A routine assembled from synchronous calls and nested routines.
///
/// Instructions are evaluated lazily, in order: a routine passed to
/// [`run`](Script::run) is only built when the script reaches it, so it sees
/// the effects of everything before it.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use waymark::task::{routine, Script, Task};
///
/// let hits = Rc::new(Cell::new(0));
/// let first = hits.clone();
/// let script = Script::new()
///     .call(move || {
///         first.set(first.get() + 1);
///         Ok(())
///     })
///     .run(|| routine::ticks(1));
///
/// let mut task = Task::from_routine(script);
/// assert!(task.advance().unwrap());
/// assert_eq!(hits.get(), 1);
/// assert!(!task.advance().unwrap());
/// ```
#[derive(Default)]
pub struct Script {
    instructions: VecDeque<Instruction>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call(mut self, f: impl FnOnce() -> Result<(), TaskError> + 'static) -> Self {
        self.instructions.push_back(Instruction::Call(Box::new(f)));
        self
    }

    pub fn run(mut self, f: impl FnOnce() -> BoxRoutine + 'static) -> Self {
        self.instructions.push_back(Instruction::Run(Box::new(f)));
        self
    }

    pub fn boxed(self) -> BoxRoutine {
        Box::new(self)
    }
}

impl Routine for Script {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        while let Some(instruction) = self.instructions.pop_front() {
            match instruction {
                Instruction::Call(f) => f()?,
                Instruction::Run(f) => return Ok(Some(Yield::Routine(f()))),
            }
        }
        Ok(None)
    }
}
