//! Routines: resumable units of work.

use super::Task;
use crate::error::{NodeFault, TaskError};
use std::any::{type_name, Any};
use std::fmt;

/// A boxed routine, the unit every hook and transition step hands back.
pub type BoxRoutine = Box<dyn Routine>;

/// A resumable computation.
///
/// Each call to [`resume`](Routine::resume) runs the routine up to its next
/// suspension point and returns what it is waiting on, or `None` once it has
/// finished.
pub trait Routine {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError>;
}

/// Something a task can wait on until it reports done.
pub trait Waitable {
    fn is_done(&self) -> bool;
}

/// What a routine is suspended on.
pub enum Yield {
    /// Resume on the next tick.
    Tick,
    /// Resume once the nested task stops running.
    Task(Task),
    /// Run the nested routine to completion first.
    Routine(BoxRoutine),
    /// Resume once the handle reports done.
    Wait(Box<dyn Waitable>),
    /// Anything else. Tasks fault with [`TaskError::UnsupportedYieldKind`].
    Other {
        kind: &'static str,
        value: Box<dyn Any>,
    },
}

impl Yield {
    pub fn routine(routine: impl Routine + 'static) -> Self {
        Self::Routine(Box::new(routine))
    }

    pub fn wait(handle: impl Waitable + 'static) -> Self {
        Self::Wait(Box::new(handle))
    }

    pub fn other<T: Any>(value: T) -> Self {
        Self::Other {
            kind: type_name::<T>(),
            value: Box::new(value),
        }
    }
}

impl fmt::Debug for Yield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick => f.write_str("Tick"),
            Self::Task(task) => f.debug_tuple("Task").field(&task.state()).finish(),
            Self::Routine(_) => f.write_str("Routine"),
            Self::Wait(_) => f.write_str("Wait"),
            Self::Other { kind, .. } => f.debug_struct("Other").field("kind", kind).finish(),
        }
    }
}

struct Done;

impl Routine for Done {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        Ok(None)
    }
}

/// A routine that finishes without suspending.
pub fn done() -> BoxRoutine {
    Box::new(Done)
}

struct Ticks(usize);

impl Routine for Ticks {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        if self.0 == 0 {
            return Ok(None);
        }
        self.0 -= 1;
        Ok(Some(Yield::Tick))
    }
}

/// A routine that suspends for `count` ticks.
pub fn ticks(count: usize) -> BoxRoutine {
    Box::new(Ticks(count))
}

struct Fail(Option<TaskError>);

impl Routine for Fail {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        match self.0.take() {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }
}

/// A routine that faults on its first resume.
pub fn fail(error: impl Into<TaskError>) -> BoxRoutine {
    Box::new(Fail(Some(error.into())))
}

/// Shorthand for a routine failing with a plain message.
pub fn fault(message: impl Into<String>) -> BoxRoutine {
    fail(NodeFault::new(message))
}

struct FromFn<F>(F);

impl<F> Routine for FromFn<F>
where
    F: FnMut() -> Result<Option<Yield>, TaskError>,
{
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        (self.0)()
    }
}

/// Build a routine from a closure called on every resume.
pub fn from_fn<F>(f: F) -> BoxRoutine
where
    F: FnMut() -> Result<Option<Yield>, TaskError> + 'static,
{
    Box::new(FromFn(f))
}

/// Suspend tick by tick until `condition` holds.
pub fn wait_until<F>(mut condition: F) -> BoxRoutine
where
    F: FnMut() -> bool + 'static,
{
    from_fn(move || Ok((!condition()).then_some(Yield::Tick)))
}

/// Suspend until `handle` reports done.
pub fn wait_for(handle: impl Waitable + 'static) -> BoxRoutine {
    let mut handle = Some(handle);
    from_fn(move || Ok(handle.take().map(Yield::wait)))
}

struct Sequence(std::vec::IntoIter<BoxRoutine>);

impl Routine for Sequence {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        Ok(self.0.next().map(Yield::Routine))
    }
}

/// Run routines one after another.
pub fn sequence(routines: Vec<BoxRoutine>) -> BoxRoutine {
    Box::new(Sequence(routines.into_iter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks_until_done(routine: BoxRoutine) -> usize {
        let mut task = Task::new(routine);
        let mut ticks = 0;
        while task.advance().unwrap() {
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn done_takes_no_ticks() {
        assert_eq!(ticks_until_done(done()), 0);
    }

    #[test]
    fn ticks_suspends_exactly_n_times() {
        assert_eq!(ticks_until_done(ticks(3)), 3);
    }

    #[test]
    fn sequence_adds_up() {
        assert_eq!(
            ticks_until_done(sequence(vec![ticks(1), done(), ticks(2)])),
            3
        );
    }

    #[test]
    fn wait_until_polls_each_tick() {
        let mut remaining = 2;
        let routine = wait_until(move || {
            remaining -= 1;
            remaining < 0
        });
        assert_eq!(ticks_until_done(routine), 2);
    }

    #[test]
    fn other_records_type_name() {
        let yielded = Yield::other(7_u32);
        assert!(matches!(yielded, Yield::Other { kind: "u32", .. }));
    }
}
