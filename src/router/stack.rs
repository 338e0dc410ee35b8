//! Linear history with truncate-on-revisit.

use super::{back_index, Rollback, Router};
use crate::error::RequestError;
use crate::node::NodeKey;
use crate::transition::{Direction, TransitionHandle, TransitionRequest};
use crate::tree::NavTree;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Keeps a stack of visited keys.
///
/// Visiting a key already on the stack truncates everything above it, so
/// the stack never holds duplicates. Going back `n` steps is a transition
/// to the entry `n` below the top. A transition that faults or is
/// cancelled leaves the stack as it was before the request.
pub struct StackRouter<K: NodeKey> {
    tree: NavTree<K>,
    stack: Vec<K>,
    rollback: Option<Rollback<K, Vec<K>>>,
}

impl<K: NodeKey> StackRouter<K> {
    pub fn new(tree: NavTree<K>) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            rollback: None,
        }
    }

    pub fn stack(&self) -> &[K] {
        match &self.rollback {
            Some(rollback) if rollback.failed() => rollback.saved(),
            _ => &self.stack,
        }
    }

    pub fn clear_stack(&mut self) {
        self.rollback = None;
        self.stack.clear();
    }

    fn reconcile(&mut self) {
        let Some(rollback) = self.rollback.take() else {
            return;
        };
        match rollback.settle() {
            Ok(Some(saved)) => {
                debug!(depth = saved.len(), "transition did not arrive; stack restored");
                self.stack = saved;
            }
            Ok(None) => {}
            Err(pending) => self.rollback = Some(pending),
        }
    }

    /// Replace the stack. Unknown and repeated keys are skipped.
    pub fn set_stack(&mut self, keys: impl IntoIterator<Item = K>) {
        let mut seen = HashSet::new();
        self.rollback = None;
        self.stack.clear();
        for key in keys {
            if !self.tree.contains(&key) {
                warn!(key = key.name(), "skipping unknown key in stack");
                continue;
            }
            if !seen.insert(key.clone()) {
                warn!(key = key.name(), "skipping repeated key in stack");
                continue;
            }
            self.stack.push(key);
        }
    }

    fn go(
        &mut self,
        key: &K,
        direction: Direction,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        if self.tree.is_transitioning() {
            return Err(RequestError::AlreadyTransitioning);
        }
        self.reconcile();
        // Already there, e.g. a restored stack resuming at the tree's node.
        let handle = if self.tree.current_key().as_ref() == Some(key) {
            TransitionHandle::empty()
        } else {
            let handle = self.tree.transition_to(key, direction, request)?;
            self.rollback = Some(Rollback::new(self.stack.clone(), &handle));
            handle
        };
        if let Some(index) = self.stack.iter().position(|k| k == key) {
            self.stack.truncate(index);
        }
        self.stack.push(key.clone());
        Ok(handle)
    }
}

impl<K: NodeKey> Router<K> for StackRouter<K> {
    fn tree(&self) -> &NavTree<K> {
        &self.tree
    }

    fn current_key(&self) -> Option<K> {
        self.stack().last().cloned()
    }

    fn transition_to(
        &mut self,
        key: &K,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        self.go(key, Direction::Forward, request)
    }

    fn back(
        &mut self,
        depth: usize,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        if self.tree.is_transitioning() {
            return Err(RequestError::AlreadyTransitioning);
        }
        self.reconcile();
        match back_index(self.stack.len(), depth) {
            Some(index) => {
                let key = self.stack[index].clone();
                self.go(&key, Direction::Back, request)
            }
            None => Ok(TransitionHandle::empty()),
        }
    }

    fn back_key(&self, depth: usize) -> Option<K> {
        let stack = self.stack();
        back_index(stack.len(), depth).map(|index| stack[index].clone())
    }

    fn keys(&self) -> Vec<K> {
        self.tree.keys()
    }

    fn history(&self) -> Vec<K> {
        self.stack().to_vec()
    }

    fn set_history(&mut self, keys: Vec<K>) {
        self.set_stack(keys);
    }
}
