//! The node contract.

use super::{NodeKey, Scope};
use crate::error::NodeFault;
use crate::task::{routine, BoxRoutine};
use crate::transition::{TransitionContext, TransitionRef};
use std::any::Any;

/// Result of a synchronous node hook.
pub type HookResult = Result<(), NodeFault>;

/// Downcasting support for node objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior of a node in the navigation tree.
///
/// Every hook has a no-op default, so a node only overrides what it needs.
/// The engine owns phase bookkeeping: hooks are called in lifecycle order
/// and never twice for the same phase entry.
///
/// Hooks that may take several ticks return a [`BoxRoutine`]. The phase
/// completes when the routine finishes. Work that must be undone when the
/// phase is left can be registered on the [`Scope`] passed in.
///
/// The `pre_open` .. `post_close` hooks are only driven for screen nodes.
///
/// # Example
///
/// ```rust
/// use waymark::node::{NavNode, Scope};
/// use waymark::task::{routine, BoxRoutine};
/// use waymark::transition::TransitionContext;
/// use waymark::node_keys;
///
/// node_keys! {
///     pub enum Key { Root, Title }
/// }
///
/// struct TitleScreen;
///
/// impl NavNode<Key> for TitleScreen {
///     fn load(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
///         // pretend assets stream in over three frames
///         routine::ticks(3)
///     }
/// }
/// ```
pub trait NavNode<K: NodeKey>: AsAny + 'static {
    /// Whether this node may load alongside sibling screens.
    fn parallel_loading(&self) -> bool {
        true
    }

    fn set_focus(&mut self, _focused: bool) {}

    /// Swap the transition used to move toward `next`. Consulted for every
    /// node being closed or opened, closest to the old position first.
    fn override_transition(&self, _next: &K, transition: TransitionRef) -> TransitionRef {
        transition
    }

    fn standby(&mut self, _scope: &Scope) -> HookResult {
        Ok(())
    }

    fn load(&mut self, _cx: &TransitionContext<K>, _scope: &Scope) -> BoxRoutine {
        routine::done()
    }

    fn initialize(&mut self, _cx: &TransitionContext<K>, _scope: &Scope) -> BoxRoutine {
        routine::done()
    }

    fn activate(&mut self, _cx: &TransitionContext<K>, _scope: &Scope) -> HookResult {
        Ok(())
    }

    fn deactivate(&mut self, _cx: &TransitionContext<K>) -> HookResult {
        Ok(())
    }

    fn terminate(&mut self, _cx: &TransitionContext<K>) -> HookResult {
        Ok(())
    }

    fn unload(&mut self, _cx: &TransitionContext<K>) -> HookResult {
        Ok(())
    }

    fn release(&mut self) {}

    /// Called once when the tree shuts down, before teardown hooks run.
    fn shutdown(&mut self) {}

    fn pre_open(&mut self, _cx: &TransitionContext<K>) -> HookResult {
        Ok(())
    }

    fn open(&mut self, _cx: &TransitionContext<K>, _scope: &Scope) -> BoxRoutine {
        routine::done()
    }

    fn post_open(&mut self, _cx: &TransitionContext<K>) -> HookResult {
        Ok(())
    }

    fn pre_close(&mut self, _cx: &TransitionContext<K>) -> HookResult {
        Ok(())
    }

    fn close(&mut self, _cx: &TransitionContext<K>, _scope: &Scope) -> BoxRoutine {
        routine::done()
    }

    fn post_close(&mut self, _cx: &TransitionContext<K>) -> HookResult {
        Ok(())
    }
}

/// Borrow a node object as its concrete type.
pub fn downcast_ref<K: NodeKey, T: NavNode<K>>(node: &dyn NavNode<K>) -> Option<&T> {
    <dyn NavNode<K> as AsAny>::as_any(node).downcast_ref::<T>()
}

/// Mutably borrow a node object as its concrete type.
pub fn downcast_mut<K: NodeKey, T: NavNode<K>>(node: &mut dyn NavNode<K>) -> Option<&mut T> {
    <dyn NavNode<K> as AsAny>::as_any_mut(node).downcast_mut::<T>()
}

/// A node with no behavior of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyNode;

impl<K: NodeKey> NavNode<K> for EmptyNode {}
