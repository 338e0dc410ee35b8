//! Tasks: a stack of suspended frames advanced one tick at a time.

use super::{BoxRoutine, Routine, Waitable, Yield};
use crate::error::TaskError;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskState {
    Running,
    Done,
    Cancelled,
    Faulted,
}

enum Frame {
    Tick,
    Task(Task),
    Routine(BoxRoutine),
    Wait(Box<dyn Waitable>),
}

impl Frame {
    fn from_yield(yielded: Yield) -> Result<Self, TaskError> {
        match yielded {
            Yield::Tick => Ok(Self::Tick),
            Yield::Task(task) => Ok(Self::Task(task)),
            Yield::Routine(routine) => Ok(Self::Routine(routine)),
            Yield::Wait(handle) => Ok(Self::Wait(handle)),
            Yield::Other { kind, .. } => Err(TaskError::UnsupportedYieldKind { kind }),
        }
    }
}

enum Step {
    Consume,
    Suspend,
    Pop,
    Push(Frame),
}

/// A cooperative task.
///
/// A task keeps a stack of frames. On every [`advance`](Task::advance) it
/// resumes the top frame: finished frames are popped and their parent resumes
/// in the same tick, nested routines are pushed and started immediately. The
/// tick ends when a frame suspends.
///
/// ```rust
/// use waymark::task::{routine, Task};
///
/// let mut task = Task::new(routine::sequence(vec![routine::ticks(1), routine::done()]));
/// assert!(task.advance().unwrap());
/// assert!(!task.advance().unwrap());
/// assert!(task.is_done());
/// ```
pub struct Task {
    stack: Vec<Frame>,
    state: TaskState,
    fault: Option<TaskError>,
}

impl Task {
    pub fn new(routine: BoxRoutine) -> Self {
        Self {
            stack: vec![Frame::Routine(routine)],
            state: TaskState::Running,
            fault: None,
        }
    }

    pub fn from_routine(routine: impl Routine + 'static) -> Self {
        Self::new(Box::new(routine))
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TaskState::Running
    }

    /// Finished in any way: completed, cancelled or faulted.
    pub fn is_done(&self) -> bool {
        !self.is_running()
    }

    pub fn fault(&self) -> Option<&TaskError> {
        self.fault.as_ref()
    }

    /// Stop the task. Its frames are dropped without being resumed again.
    pub fn cancel(&mut self) {
        if self.is_running() {
            self.stack.clear();
            self.state = TaskState::Cancelled;
        }
    }

    /// Run until the next suspension point. Returns whether the task is still
    /// running afterwards. A fault stops the task and is returned once.
    pub fn advance(&mut self) -> Result<bool, TaskError> {
        if !self.is_running() {
            return Ok(false);
        }
        match self.step() {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.state = TaskState::Done;
                Ok(false)
            }
            Err(error) => {
                self.stack.clear();
                self.state = TaskState::Faulted;
                self.fault = Some(error.clone());
                Err(error)
            }
        }
    }

    fn step(&mut self) -> Result<bool, TaskError> {
        loop {
            let Some(top) = self.stack.last_mut() else {
                return Ok(false);
            };
            let step = match top {
                Frame::Tick => Step::Consume,
                Frame::Task(inner) => {
                    if inner.advance()? {
                        Step::Suspend
                    } else if let Some(fault) = inner.fault() {
                        // Yielded after it had already faulted.
                        return Err(fault.clone());
                    } else {
                        Step::Pop
                    }
                }
                Frame::Routine(routine) => match routine.resume()? {
                    Some(yielded) => Step::Push(Frame::from_yield(yielded)?),
                    None => Step::Pop,
                },
                Frame::Wait(handle) => {
                    if handle.is_done() {
                        Step::Pop
                    } else {
                        Step::Suspend
                    }
                }
            };
            match step {
                Step::Consume => {
                    self.stack.pop();
                    return Ok(true);
                }
                Step::Suspend => return Ok(true),
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Push(frame) => self.stack.push(frame),
            }
        }
    }
}

impl Waitable for Task {
    fn is_done(&self) -> bool {
        Task::is_done(self)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("state", &self.state)
            .field("depth", &self.stack.len())
            .finish()
    }
}
