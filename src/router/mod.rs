//! Routers: history policies layered over a navigation tree.
//!
//! A router decides *where* to go (and what "back" means); the tree decides
//! *how* to get there.

mod graph;
mod graph_builder;
mod journal;
mod stack;

pub use graph::TreeRouter;
pub use graph_builder::{RouteSpec, TreeRouterBuilder};
pub use journal::{JournalEntry, NavigationJournal, DEFAULT_JOURNAL_CAPACITY};
pub use stack::StackRouter;

use crate::error::RequestError;
use crate::node::NodeKey;
use crate::transition::{TransitionHandle, TransitionRequest};
use crate::tree::NavTree;

/// A navigation policy over a [`NavTree`].
pub trait Router<K: NodeKey> {
    fn tree(&self) -> &NavTree<K>;

    /// Where the router last routed to. A faulted or cancelled transition
    /// leaves this at the position before it.
    fn current_key(&self) -> Option<K>;

    fn is_transitioning(&self) -> bool {
        self.tree().is_transitioning()
    }

    fn transition_to(
        &mut self,
        key: &K,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError>;

    /// Go back `depth` steps. Depth is clamped to the available history;
    /// with nothing to go back to the result is an empty handle.
    fn back(
        &mut self,
        depth: usize,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError>;

    /// Close and reopen the current path.
    fn reset(&mut self, request: TransitionRequest<K>) -> Result<TransitionHandle<K>, RequestError> {
        self.tree().reset(request)
    }

    /// The key [`back`](Router::back) would go to, without going.
    fn back_key(&self, depth: usize) -> Option<K>;

    /// Every key this router can route to.
    fn keys(&self) -> Vec<K>;

    /// History from oldest to current.
    fn history(&self) -> Vec<K>;

    /// Replace the history without running a transition.
    fn set_history(&mut self, keys: Vec<K>);
}

/// Clamp a back depth against a history of `len` entries. `None` means
/// there is nowhere to go.
pub(crate) fn back_index(len: usize, depth: usize) -> Option<usize> {
    if len <= 1 || depth == 0 {
        return None;
    }
    Some(len - 1 - depth.min(len - 1))
}

/// Router history saved before a transition, put back if the transition
/// never arrives.
pub(crate) struct Rollback<K: NodeKey, S> {
    saved: S,
    handle: TransitionHandle<K>,
}

impl<K: NodeKey, S> Rollback<K, S> {
    pub fn new(saved: S, handle: &TransitionHandle<K>) -> Self {
        Self {
            saved,
            handle: handle.clone(),
        }
    }

    /// The transition finished without reaching its target. An empty
    /// handle means the target was already current.
    pub fn failed(&self) -> bool {
        !self.handle.is_empty() && self.handle.is_done() && self.handle.result().is_none()
    }

    pub fn saved(&self) -> &S {
        &self.saved
    }

    /// Resolve a finished transition: `Some(saved)` if it failed, `None` if
    /// it arrived. A pending transition is handed back untouched.
    pub fn settle(self) -> Result<Option<S>, Self> {
        if !self.handle.is_done() {
            return Err(self);
        }
        let failed = self.failed();
        Ok(failed.then_some(self.saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_index_clamps_depth() {
        assert_eq!(back_index(3, 1), Some(1));
        assert_eq!(back_index(3, 2), Some(0));
        assert_eq!(back_index(3, 10), Some(0));
        assert_eq!(back_index(1, 1), None);
        assert_eq!(back_index(0, 1), None);
        assert_eq!(back_index(3, 0), None);
    }
}
