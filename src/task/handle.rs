//! Completion handles for background work.

use super::Waitable;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsyncStatus {
    Pending,
    Completed,
    Aborted(Option<String>),
}

/// Shared completion flag for work running on the scheduler.
///
/// Clones observe the same status. The first transition out of `Pending`
/// wins; later calls are ignored.
#[derive(Clone, Debug)]
pub struct AsyncHandle {
    status: Rc<RefCell<AsyncStatus>>,
}

impl AsyncHandle {
    pub fn new() -> Self {
        Self {
            status: Rc::new(RefCell::new(AsyncStatus::Pending)),
        }
    }

    /// A handle that is already complete.
    pub fn completed() -> Self {
        let handle = Self::new();
        handle.complete();
        handle
    }

    pub fn status(&self) -> AsyncStatus {
        self.status.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        *self.status.borrow() == AsyncStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        *self.status.borrow() == AsyncStatus::Completed
    }

    pub fn is_aborted(&self) -> bool {
        matches!(*self.status.borrow(), AsyncStatus::Aborted(_))
    }

    pub fn complete(&self) {
        self.settle(AsyncStatus::Completed);
    }

    pub fn abort(&self, reason: Option<String>) {
        self.settle(AsyncStatus::Aborted(reason));
    }

    fn settle(&self, status: AsyncStatus) {
        let mut current = self.status.borrow_mut();
        if *current == AsyncStatus::Pending {
            *current = status;
        }
    }
}

impl Default for AsyncHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Waitable for AsyncHandle {
    fn is_done(&self) -> bool {
        !self.is_pending()
    }
}
