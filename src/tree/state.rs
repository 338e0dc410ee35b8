//! Shared tree state.

use super::{PreloadRecord, PreloadState, TransitionRecord};
use crate::error::RequestError;
use crate::node::{NodeId, NodeKey, NodeKind, Phase, SharedCell};
use crate::transition::{EffectRef, TransitionContext};
use std::collections::HashMap;
use tracing::debug;

pub(crate) struct TreeState<K: NodeKey> {
    pub cells: Vec<SharedCell<K>>,
    pub keys: Vec<K>,
    pub kinds: Vec<NodeKind>,
    pub parents: Vec<Option<NodeId>>,
    pub registry: HashMap<K, NodeId>,
    pub current: Option<NodeId>,
    /// Root first, current last.
    pub running: Vec<NodeId>,
    pub record: Option<TransitionRecord<K>>,
    pub preloads: HashMap<K, PreloadRecord>,
    pub shut_down: bool,
}

impl<K: NodeKey> TreeState<K> {
    pub fn cell(&self, id: NodeId) -> &SharedCell<K> {
        &self.cells[id.index()]
    }

    pub fn key(&self, id: NodeId) -> &K {
        &self.keys[id.index()]
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    pub fn lookup(&self, key: &K) -> Result<NodeId, RequestError> {
        self.registry
            .get(key)
            .copied()
            .ok_or_else(|| RequestError::UnknownKey {
                key: key.name().to_string(),
            })
    }

    /// Root first.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = super::path::ancestors(|n| self.parent_of(n), id);
        path.reverse();
        path
    }

    pub fn cells_of(&self, ids: &[NodeId]) -> Vec<SharedCell<K>> {
        ids.iter().map(|&id| self.cell(id).clone()).collect()
    }

    pub fn is_retained(&self, id: NodeId) -> bool {
        self.preloads.contains_key(self.key(id))
    }

    /// Settle the running path after a transition stopped early.
    ///
    /// The common ancestor chain survives, followed by every opened node
    /// that reached `Active`. The rest of the transition's nodes are
    /// returned for teardown; hooks must not run while the tree is
    /// borrowed, so the caller applies the plan once the borrow is gone.
    pub fn recover(&mut self, record: &TransitionRecord<K>) -> Recovery<K> {
        let mut running = record
            .path
            .ancestor
            .map(|ancestor| self.path_to(ancestor))
            .unwrap_or_default();
        for &id in &record.path.open {
            if self.cell(id).borrow().phase() != Phase::Active {
                break;
            }
            running.push(id);
        }

        let mut teardown = Vec::new();
        for &id in record.path.close.iter().chain(record.path.open.iter().rev()) {
            if running.contains(&id) {
                continue;
            }
            let cell = self.cell(id);
            let preload = self.preloads.get(self.key(id)).map(|r| r.state);
            // A preload still loading this node finishes or unloads it itself.
            if preload == Some(PreloadState::Loading) && cell.borrow().phase() == Phase::Loading {
                continue;
            }
            teardown.push((cell.clone(), preload.is_some()));
        }

        self.current = running.last().copied();
        self.running = running;
        debug!(
            current = ?self.current.map(|id| self.key(id).name().to_string()),
            torn_down = teardown.len(),
            "running path recovered"
        );
        Recovery {
            effects: if record.effects_active {
                record.effects.clone()
            } else {
                Vec::new()
            },
            teardown,
            focus: self.current.map(|id| self.cell(id).clone()),
            context: record.context.clone(),
        }
    }
}

/// Work left over from [`TreeState::recover`] that calls into nodes.
pub(crate) struct Recovery<K: NodeKey> {
    effects: Vec<EffectRef>,
    /// Cells to put back in `Standby`, flagged when a preload keeps them loaded.
    teardown: Vec<(SharedCell<K>, bool)>,
    focus: Option<SharedCell<K>>,
    context: TransitionContext<K>,
}

impl<K: NodeKey> Recovery<K> {
    pub fn apply(self) {
        for effect in &self.effects {
            effect.end_transition();
        }
        for (cell, retained) in &self.teardown {
            cell.borrow_mut().teardown(*retained, &self.context);
        }
        if let Some(top) = self.focus {
            top.borrow_mut().set_focus(true);
        }
    }
}
