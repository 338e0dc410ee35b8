//! Bookkeeping for the transition in flight.

use super::TransitionPath;
use crate::node::{NodeId, NodeKey};
use crate::task::TaskId;
use crate::transition::{EffectRef, TransitionContext, TransitionHandle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse progress of the transition in flight.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TransitionState {
    Standby,
    Initializing,
    Opening,
    Closing,
    Completed,
}

pub(crate) struct TransitionRecord<K: NodeKey> {
    pub id: Uuid,
    pub target: NodeId,
    pub path: TransitionPath,
    /// The running path when the transition was requested.
    pub previous: Vec<NodeId>,
    pub context: TransitionContext<K>,
    pub effects: Vec<EffectRef>,
    /// Effects have begun and not yet ended.
    pub effects_active: bool,
    pub state: TransitionState,
    pub handle: TransitionHandle<K>,
    pub task: Option<TaskId>,
}

impl<K: NodeKey> TransitionRecord<K> {
    pub fn new(
        target: NodeId,
        path: TransitionPath,
        previous: Vec<NodeId>,
        context: TransitionContext<K>,
        effects: Vec<EffectRef>,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            target,
            path,
            previous,
            context,
            effects,
            effects_active: false,
            state: TransitionState::Standby,
            handle: TransitionHandle::pending(id),
            task: None,
        }
    }
}
