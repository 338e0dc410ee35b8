//! Fan-out of several routines advanced in lockstep.

use super::{BoxRoutine, Routine, Task, Yield};
use crate::error::TaskError;
use tracing::warn;

/// Advances every child once per tick and finishes when all children have
/// finished.
///
/// A child that faults is dropped while its siblings keep running; once
/// everything has settled the merged routine fails with the first fault.
/// Contract violations such as an unsupported yield fail immediately.
pub struct MergedRoutine {
    children: Vec<Option<Task>>,
    fault: Option<TaskError>,
}

impl MergedRoutine {
    pub fn new(routines: impl IntoIterator<Item = BoxRoutine>) -> Self {
        Self {
            children: routines.into_iter().map(|r| Some(Task::new(r))).collect(),
            fault: None,
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Routine for MergedRoutine {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        let mut pending = false;
        for slot in &mut self.children {
            let Some(child) = slot else { continue };
            match child.advance() {
                Ok(true) => pending = true,
                Ok(false) => *slot = None,
                Err(error) if error.is_contract_violation() => return Err(error),
                Err(error) => {
                    warn!(error = %error, "merged child faulted; siblings keep running");
                    *slot = None;
                    if self.fault.is_none() {
                        self.fault = Some(error);
                    }
                }
            }
        }
        if pending {
            return Ok(Some(Yield::Tick));
        }
        match self.fault.take() {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }
}

/// Run routines side by side.
pub fn merge(routines: impl IntoIterator<Item = BoxRoutine>) -> BoxRoutine {
    Box::new(MergedRoutine::new(routines))
}
