//! Disposal scopes bound to lifecycle phases.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A bag of cleanup actions that run together when the scope is disposed.
///
/// The engine opens a scope when a node enters a phase and disposes it when
/// the node leaves that phase, so work registered with [`Scope::defer`]
/// never outlives the phase it was started in. Actions run in reverse
/// registration order. Deferring onto an already disposed scope runs the
/// action immediately.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use waymark::node::Scope;
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let scope = Scope::new();
/// let first = log.clone();
/// scope.defer(move || first.borrow_mut().push("first"));
/// let second = log.clone();
/// scope.defer(move || second.borrow_mut().push("second"));
///
/// scope.dispose();
/// assert_eq!(*log.borrow(), vec!["second", "first"]);
/// ```
#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    disposed: Cell<bool>,
    actions: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&self, action: impl FnOnce() + 'static) {
        if self.is_disposed() {
            action();
            return;
        }
        self.inner.actions.borrow_mut().push(Box::new(action));
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Run every deferred action. Disposing twice is a no-op.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let actions = std::mem::take(&mut *self.inner.actions.borrow_mut());
        for action in actions.into_iter().rev() {
            action();
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("disposed", &self.is_disposed())
            .field("pending", &self.inner.actions.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_runs_actions_once() {
        let count = Rc::new(Cell::new(0));
        let scope = Scope::new();
        let counter = count.clone();
        scope.defer(move || counter.set(counter.get() + 1));

        scope.dispose();
        scope.dispose();

        assert_eq!(count.get(), 1);
        assert!(scope.is_disposed());
    }

    #[test]
    fn defer_after_dispose_runs_immediately() {
        let ran = Rc::new(Cell::new(false));
        let scope = Scope::new();
        scope.dispose();

        let flag = ran.clone();
        scope.defer(move || flag.set(true));

        assert!(ran.get());
    }

    #[test]
    fn clones_share_disposal() {
        let scope = Scope::new();
        let clone = scope.clone();
        clone.dispose();
        assert!(scope.is_disposed());
    }
}
