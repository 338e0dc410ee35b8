//! Declared route graph.

use super::{Rollback, Router};
use crate::error::RequestError;
use crate::node::NodeKey;
use crate::transition::{Direction, TransitionHandle, TransitionRequest};
use crate::tree::NavTree;
use tracing::{debug, warn};

pub(crate) struct RouteNode<K: NodeKey> {
    pub key: K,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// A route node reachable from anywhere inside `scope`, or from anywhere at
/// all when `scope` is `None`.
pub(crate) struct Fallback {
    pub target: usize,
    pub scope: Option<usize>,
}

pub(crate) struct RouteGraph<K: NodeKey> {
    pub nodes: Vec<RouteNode<K>>,
    pub roots: Vec<usize>,
    pub fallbacks: Vec<Fallback>,
}

impl<K: NodeKey> RouteGraph<K> {
    /// `index` and its ancestors, innermost first.
    fn lineage(&self, index: usize) -> Vec<usize> {
        let mut chain = vec![index];
        let mut cursor = index;
        while let Some(parent) = self.nodes[cursor].parent {
            chain.push(parent);
            cursor = parent;
        }
        chain
    }

    /// Resolution order: a declared child, then a declared ancestor, then a
    /// fallback in the nearest enclosing scope (global last), then a root.
    pub fn resolve(&self, from: Option<usize>, key: &K) -> Option<(usize, Direction)> {
        if let Some(position) = from {
            let node = &self.nodes[position];
            if let Some(&child) = node.children.iter().find(|&&c| self.nodes[c].key == *key) {
                return Some((child, Direction::Forward));
            }

            let lineage = self.lineage(position);
            if let Some(&ancestor) = lineage[1..].iter().find(|&&a| self.nodes[a].key == *key) {
                return Some((ancestor, Direction::Back));
            }

            let scopes = lineage.iter().map(|&i| Some(i)).chain(std::iter::once(None));
            for scope in scopes {
                let hit = self
                    .fallbacks
                    .iter()
                    .find(|f| f.scope == scope && self.nodes[f.target].key == *key);
                if let Some(fallback) = hit {
                    return Some((fallback.target, Direction::Forward));
                }
            }
        }

        self.roots
            .iter()
            .find(|&&r| self.nodes[r].key == *key)
            .map(|&root| (root, Direction::Forward))
    }
}

/// Routes along a declared graph of allowed moves.
///
/// Forward moves follow declared edges; `back` climbs the declared parents.
/// Fallbacks make a node reachable from everywhere within a scope. Built
/// with [`TreeRouterBuilder`](super::TreeRouterBuilder). A transition
/// that does not arrive leaves the router where it was.
pub struct TreeRouter<K: NodeKey> {
    tree: NavTree<K>,
    graph: RouteGraph<K>,
    position: Option<usize>,
    rollback: Option<Rollback<K, Option<usize>>>,
}

impl<K: NodeKey> TreeRouter<K> {
    pub(crate) fn new(tree: NavTree<K>, graph: RouteGraph<K>) -> Self {
        Self {
            tree,
            graph,
            position: None,
            rollback: None,
        }
    }

    fn position(&self) -> Option<usize> {
        match &self.rollback {
            Some(rollback) if rollback.failed() => *rollback.saved(),
            _ => self.position,
        }
    }

    fn reconcile(&mut self) {
        let Some(rollback) = self.rollback.take() else {
            return;
        };
        match rollback.settle() {
            Ok(Some(saved)) => {
                debug!("transition did not arrive; route position restored");
                self.position = saved;
            }
            Ok(None) => {}
            Err(pending) => self.rollback = Some(pending),
        }
    }

    fn back_target(&self, depth: usize) -> Option<usize> {
        let position = self.position()?;
        if depth == 0 {
            return None;
        }
        let lineage = self.graph.lineage(position);
        let target = lineage[depth.min(lineage.len() - 1)];
        (target != position).then_some(target)
    }

    fn go(
        &mut self,
        target: usize,
        direction: Direction,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        let key = self.graph.nodes[target].key.clone();
        let handle = self.tree.transition_to(&key, direction, request)?;
        self.rollback = Some(Rollback::new(self.position, &handle));
        self.position = Some(target);
        Ok(handle)
    }
}

impl<K: NodeKey> Router<K> for TreeRouter<K> {
    fn tree(&self) -> &NavTree<K> {
        &self.tree
    }

    fn current_key(&self) -> Option<K> {
        self.position().map(|p| self.graph.nodes[p].key.clone())
    }

    fn transition_to(
        &mut self,
        key: &K,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        if self.tree.is_transitioning() {
            return Err(RequestError::AlreadyTransitioning);
        }
        self.reconcile();
        if !self.tree.contains(key) {
            return Err(RequestError::UnknownKey {
                key: key.name().to_string(),
            });
        }
        // Re-entering the current route, e.g. after a transition into it faulted.
        let resolved = match self.position {
            Some(p) if self.graph.nodes[p].key == *key => Some((p, Direction::Forward)),
            from => self.graph.resolve(from, key),
        };
        if self.tree.current_key().as_ref() == Some(key) {
            if let Some((target, _)) = resolved {
                self.position = Some(target);
            }
            return Ok(TransitionHandle::empty());
        }
        let Some((target, direction)) = resolved else {
            let from = self
                .current_key()
                .map_or_else(|| "<none>".to_string(), |k| k.name().to_string());
            debug!(from = %from, to = key.name(), "no route");
            return Err(RequestError::NoRoute {
                from,
                to: key.name().to_string(),
            });
        };
        self.go(target, direction, request)
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
        match self.back_target(depth) {
            Some(target) => self.go(target, Direction::Back, request),
            None => Ok(TransitionHandle::empty()),
        }
    }

    fn back_key(&self, depth: usize) -> Option<K> {
        self.back_target(depth)
            .map(|target| self.graph.nodes[target].key.clone())
    }

    fn keys(&self) -> Vec<K> {
        let mut keys: Vec<K> = Vec::new();
        for node in &self.graph.nodes {
            if !keys.contains(&node.key) {
                keys.push(node.key.clone());
            }
        }
        keys
    }

    fn history(&self) -> Vec<K> {
        let Some(position) = self.position() else {
            return Vec::new();
        };
        self.graph
            .lineage(position)
            .into_iter()
            .rev()
            .map(|i| self.graph.nodes[i].key.clone())
            .collect()
    }

    /// Follows declared edges from a root; stops at the first key that does
    /// not continue the path.
    fn set_history(&mut self, keys: Vec<K>) {
        let mut position: Option<usize> = None;
        for key in &keys {
            let candidates = match position {
                Some(p) => &self.graph.nodes[p].children,
                None => &self.graph.roots,
            };
            match candidates.iter().find(|&&c| self.graph.nodes[c].key == *key) {
                Some(&next) => position = Some(next),
                None => {
                    warn!(key = key.name(), "history does not follow the route graph");
                    break;
                }
            }
        }
        self.rollback = None;
        self.position = position;
    }
}
