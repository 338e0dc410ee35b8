//! The cooperative scheduler that owns running tasks.

use super::Task;
use crate::error::TaskError;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TaskId(u64);

/// Callbacks fired when a task settles. Exactly one of them runs per task.
#[derive(Default)]
pub struct TaskCallbacks {
    on_complete: Option<Box<dyn FnOnce()>>,
    on_cancel: Option<Box<dyn FnOnce()>>,
    on_fault: Option<Box<dyn FnOnce(TaskError)>>,
}

impl TaskCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_cancel(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    pub fn on_fault(mut self, f: impl FnOnce(TaskError) + 'static) -> Self {
        self.on_fault = Some(Box::new(f));
        self
    }

    fn settle(self, outcome: Outcome) {
        match outcome {
            Outcome::Completed => {
                if let Some(f) = self.on_complete {
                    f();
                }
            }
            Outcome::Cancelled => {
                if let Some(f) = self.on_cancel {
                    f();
                }
            }
            Outcome::Faulted(error) => match self.on_fault {
                Some(f) => f(error),
                None => warn!(error = %error, "task faulted with no fault handler"),
            },
        }
    }
}

enum Outcome {
    Completed,
    Cancelled,
    Faulted(TaskError),
}

struct Entry {
    id: TaskId,
    task: Task,
    callbacks: TaskCallbacks,
}

#[derive(Default)]
struct SchedulerInner {
    entries: Vec<Entry>,
    next_id: u64,
    updating: bool,
    deferred_cancels: Vec<TaskId>,
}

/// Owns running tasks and advances each of them once per [`update`](Scheduler::update).
///
/// The scheduler is a cheap handle; clones share the same task list. Tasks
/// spawned while an update is running are first advanced on the next update.
/// Callbacks run after the update has released its internal borrow, so they
/// may spawn or cancel tasks themselves.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, task: Task, callbacks: TaskCallbacks) -> TaskId {
        let mut inner = self.inner.borrow_mut();
        let id = TaskId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(Entry { id, task, callbacks });
        debug!(task = id.0, "task spawned");
        id
    }

    /// Cancel a task and fire its cancel callback. Unknown or finished ids
    /// are ignored.
    pub fn cancel(&self, id: TaskId) {
        let entry = {
            let mut inner = self.inner.borrow_mut();
            match inner.entries.iter().position(|e| e.id == id) {
                Some(index) => Some(inner.entries.remove(index)),
                None => {
                    if inner.updating {
                        inner.deferred_cancels.push(id);
                    }
                    None
                }
            }
        };
        if let Some(mut entry) = entry {
            entry.task.cancel();
            debug!(task = id.0, "task cancelled");
            entry.callbacks.settle(Outcome::Cancelled);
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance every task once.
    pub fn update(&self) {
        let mut entries = {
            let mut inner = self.inner.borrow_mut();
            inner.updating = true;
            std::mem::take(&mut inner.entries)
        };

        let mut settled = Vec::new();
        entries.retain_mut(|entry| match entry.task.advance() {
            Ok(true) => true,
            Ok(false) => {
                settled.push((std::mem::take(&mut entry.callbacks), Outcome::Completed));
                false
            }
            Err(error) => {
                settled.push((std::mem::take(&mut entry.callbacks), Outcome::Faulted(error)));
                false
            }
        });

        {
            let mut inner = self.inner.borrow_mut();
            inner.updating = false;
            let spawned = std::mem::take(&mut inner.entries);
            entries.extend(spawned);
            for id in std::mem::take(&mut inner.deferred_cancels) {
                if let Some(index) = entries.iter().position(|e| e.id == id) {
                    let mut entry = entries.remove(index);
                    entry.task.cancel();
                    settled.push((entry.callbacks, Outcome::Cancelled));
                }
            }
            inner.entries = entries;
        }

        for (callbacks, outcome) in settled {
            callbacks.settle(outcome);
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("tasks", &self.len()).finish()
    }
}
