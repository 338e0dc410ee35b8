//! Handles to in-flight transitions.

use crate::error::TaskError;
use crate::node::NodeKey;
use crate::task::Waitable;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

type Listener<K> = Box<dyn FnOnce(Option<&K>)>;

enum Outcome<K> {
    Pending,
    Finished(Option<K>),
}

struct HandleState<K> {
    id: Option<Uuid>,
    outcome: Outcome<K>,
    fault: Option<TaskError>,
    listeners: Vec<Listener<K>>,
}

/// Observer for one transition.
///
/// The handle resolves exactly once. On normal completion the result is the
/// key of the node reached; when the transition was cancelled or faulted the
/// result is `None` and [`fault`](TransitionHandle::fault) tells which.
///
/// An *empty* handle stands for a request that did nothing (for example a
/// transition to the node that is already current). It is born resolved.
pub struct TransitionHandle<K: NodeKey> {
    state: Rc<RefCell<HandleState<K>>>,
}

impl<K: NodeKey> Clone for TransitionHandle<K> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K: NodeKey> TransitionHandle<K> {
    pub(crate) fn pending(id: Uuid) -> Self {
        Self {
            state: Rc::new(RefCell::new(HandleState {
                id: Some(id),
                outcome: Outcome::Pending,
                fault: None,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn empty() -> Self {
        Self {
            state: Rc::new(RefCell::new(HandleState {
                id: None,
                outcome: Outcome::Finished(None),
                fault: None,
                listeners: Vec::new(),
            })),
        }
    }

    /// Transition id, `None` for the empty handle.
    pub fn id(&self) -> Option<Uuid> {
        self.state.borrow().id
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().id.is_none()
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state.borrow().outcome, Outcome::Pending)
    }

    pub fn is_done(&self) -> bool {
        !self.is_transitioning()
    }

    /// Key of the node reached, once the transition completed normally.
    pub fn result(&self) -> Option<K> {
        match &self.state.borrow().outcome {
            Outcome::Finished(key) => key.clone(),
            Outcome::Pending => None,
        }
    }

    pub fn fault(&self) -> Option<TaskError> {
        self.state.borrow().fault.clone()
    }

    /// Run `listener` when the transition resolves, or right away if it
    /// already has.
    pub fn on_finished(&self, listener: impl FnOnce(Option<&K>) + 'static) {
        let resolved = {
            let mut state = self.state.borrow_mut();
            match &state.outcome {
                Outcome::Pending => {
                    state.listeners.push(Box::new(listener));
                    return;
                }
                Outcome::Finished(key) => key.clone(),
            }
        };
        listener(resolved.as_ref());
    }

    /// Resolve the handle. Only the first call has an effect.
    pub(crate) fn finish(&self, reached: Option<K>, fault: Option<TaskError>) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if !matches!(state.outcome, Outcome::Pending) {
                return;
            }
            state.outcome = Outcome::Finished(reached.clone());
            state.fault = fault;
            std::mem::take(&mut state.listeners)
        };
        for listener in listeners {
            listener(reached.as_ref());
        }
    }
}

impl<K: NodeKey> Waitable for TransitionHandle<K> {
    fn is_done(&self) -> bool {
        TransitionHandle::is_done(self)
    }
}

impl<K: NodeKey> fmt::Debug for TransitionHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionHandle")
            .field("id", &self.id())
            .field("transitioning", &self.is_transitioning())
            .field("result", &self.result())
            .finish()
    }
}
