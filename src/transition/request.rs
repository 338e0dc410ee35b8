//! Transition requests.

use super::{EffectRef, TransitionRef};
use crate::node::{downcast_mut, NavNode, NodeKey};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Flags that change how a transition runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TransitionOption {
    /// Close and reopen the whole path, root included, even when the target
    /// is already current.
    pub refresh: bool,
}

/// Callback run on the target node right before its path starts loading.
pub type SetupFn<K> = Box<dyn FnOnce(&mut dyn NavNode<K>)>;

/// Everything a caller can attach to a transition.
///
/// ```rust
/// use waymark::transition::{Cross, DelayEffect, TransitionRequest};
///
/// let request = TransitionRequest::<String>::new()
///     .with_transition(Cross::new())
///     .with_effect(DelayEffect::new(2, 2));
/// assert_eq!(request.effects.len(), 1);
/// ```
pub struct TransitionRequest<K: NodeKey> {
    pub option: TransitionOption,
    pub setup: Option<SetupFn<K>>,
    pub transition: Option<TransitionRef>,
    pub effects: Vec<EffectRef>,
}

impl<K: NodeKey> Default for TransitionRequest<K> {
    fn default() -> Self {
        Self {
            option: TransitionOption::default(),
            setup: None,
            transition: None,
            effects: Vec::new(),
        }
    }
}

impl<K: NodeKey> TransitionRequest<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(mut self) -> Self {
        self.option.refresh = true;
        self
    }

    pub fn with_option(mut self, option: TransitionOption) -> Self {
        self.option = option;
        self
    }

    pub fn with_transition(mut self, transition: impl super::Transition + 'static) -> Self {
        self.transition = Some(Rc::new(transition));
        self
    }

    pub fn with_transition_ref(mut self, transition: TransitionRef) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn with_effect(mut self, effect: impl super::TransitionEffect + 'static) -> Self {
        self.effects.push(Rc::new(effect));
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = EffectRef>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn with_setup(mut self, setup: impl FnOnce(&mut dyn NavNode<K>) + 'static) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Typed setup: runs only if the target node is a `T`.
    pub fn setup<T: NavNode<K>>(self, setup: impl FnOnce(&mut T) + 'static) -> Self {
        self.with_setup(move |node| {
            if let Some(node) = downcast_mut::<K, T>(node) {
                setup(node);
            }
        })
    }
}
