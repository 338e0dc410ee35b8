//! Cooperative, tick-driven task scheduling.
//!
//! Work is expressed as [`Routine`]s that suspend by yielding a [`Yield`].
//! A [`Task`] runs a stack of nested routines; the [`Scheduler`] advances all
//! of its tasks once per update.

mod handle;
mod merged;
pub mod routine;
mod scheduler;
mod script;
mod task;

pub use handle::{AsyncHandle, AsyncStatus};
pub use merged::{merge, MergedRoutine};
pub use routine::{BoxRoutine, Routine, Waitable, Yield};
pub use scheduler::{Scheduler, TaskCallbacks, TaskId};
pub use script::Script;
pub use task::{Task, TaskState};
