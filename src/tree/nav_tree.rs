//! The navigation tree.

use super::path::{self, TransitionPath};
use super::{
    PreloadRecord, PreloadState, TransitionRecord, TransitionState, TreeResolver, TreeState,
};
use crate::error::{RequestError, TaskError};
use crate::node::{
    downcast_mut, downcast_ref, NavNode, NodeCell, NodeId, NodeKey, NodeKind, Phase, PhaseRoutine,
};
use crate::task::{routine, AsyncHandle, Scheduler, Script, Task, TaskCallbacks};
use crate::transition::{
    Direction, Sequential, SetupFn, Transition, TransitionContext, TransitionHandle,
    TransitionKind, TransitionRef, TransitionRequest, TransitionResolver,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

enum Settled {
    Completed,
    Cancelled,
    Faulted(TaskError),
}

/// A tree of navigation nodes and the single transition running through it.
///
/// The tree is a cheap handle: clones share the same nodes and scheduler.
/// Nothing happens between calls to [`update`](NavTree::update); every
/// transition and preload advances one tick per update.
///
/// The *running path* is the chain of nodes from the root to the current
/// node. A transition closes the part of the old running path below the
/// common ancestor and opens the part of the new one, see [`path::plan`].
pub struct NavTree<K: NodeKey> {
    shared: Rc<RefCell<TreeState<K>>>,
    scheduler: Scheduler,
}

impl<K: NodeKey> Clone for NavTree<K> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<K: NodeKey> NavTree<K> {
    pub(crate) fn from_cells(cells: Vec<NodeCell<K>>, registry: HashMap<K, NodeId>) -> Self {
        let keys = cells.iter().map(|c| c.key().clone()).collect();
        let kinds = cells.iter().map(NodeCell::kind).collect();
        let parents = cells.iter().map(NodeCell::parent).collect();
        let cells: Vec<_> = cells
            .into_iter()
            .map(|cell| Rc::new(RefCell::new(cell)))
            .collect();

        for cell in &cells {
            let mut cell = cell.borrow_mut();
            if let Err(error) = cell.enter_standby() {
                warn!(node = cell.key().name(), error = %error, "standby hook failed");
            }
        }
        info!(nodes = cells.len(), "navigation tree ready");

        Self {
            shared: Rc::new(RefCell::new(TreeState {
                cells,
                keys,
                kinds,
                parents,
                registry,
                current: None,
                running: Vec::new(),
                record: None,
                preloads: HashMap::new(),
                shut_down: false,
            })),
            scheduler: Scheduler::new(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Advance every transition and preload by one tick.
    pub fn update(&self) {
        self.scheduler.update();
    }

    pub fn is_transitioning(&self) -> bool {
        self.shared.borrow().record.is_some()
    }

    pub fn transition_state(&self) -> Option<TransitionState> {
        self.shared.borrow().record.as_ref().map(|r| r.state)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.borrow().shut_down
    }

    pub fn current_key(&self) -> Option<K> {
        let state = self.shared.borrow();
        state.current.map(|id| state.key(id).clone())
    }

    /// Root first, current last.
    pub fn running_keys(&self) -> Vec<K> {
        let state = self.shared.borrow();
        state.running.iter().map(|&id| state.key(id).clone()).collect()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shared.borrow().registry.contains_key(key)
    }

    pub fn contains_in_path(&self, key: &K) -> bool {
        let state = self.shared.borrow();
        state
            .registry
            .get(key)
            .is_some_and(|id| state.running.contains(id))
    }

    /// Every key, in declaration order.
    pub fn keys(&self) -> Vec<K> {
        self.shared.borrow().keys.clone()
    }

    pub fn kind_of(&self, key: &K) -> Option<NodeKind> {
        let state = self.shared.borrow();
        state.registry.get(key).map(|id| state.kinds[id.index()])
    }

    pub fn parent_key(&self, key: &K) -> Option<K> {
        let state = self.shared.borrow();
        let id = state.registry.get(key)?;
        state.parent_of(*id).map(|parent| state.key(parent).clone())
    }

    pub fn phase_of(&self, key: &K) -> Option<Phase> {
        let state = self.shared.borrow();
        state
            .registry
            .get(key)
            .map(|&id| state.cell(id).borrow().phase())
    }

    pub fn is_opened(&self, key: &K) -> bool {
        let state = self.shared.borrow();
        state
            .registry
            .get(key)
            .is_some_and(|&id| state.cell(id).borrow().is_opened())
    }

    pub fn preload_state(&self, key: &K) -> PreloadState {
        self.shared
            .borrow()
            .preloads
            .get(key)
            .map_or(PreloadState::None, |r| r.state)
    }

    /// Borrow the node behind `key` as a `T`.
    pub fn with_node<T: NavNode<K>, R>(&self, key: &K, f: impl FnOnce(&T) -> R) -> Option<R> {
        let cell = {
            let state = self.shared.borrow();
            state.cell(*state.registry.get(key)?).clone()
        };
        let cell = cell.borrow();
        downcast_ref::<K, T>(cell.node()).map(f)
    }

    pub fn with_node_mut<T: NavNode<K>, R>(
        &self,
        key: &K,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let cell = {
            let state = self.shared.borrow();
            state.cell(*state.registry.get(key)?).clone()
        };
        let mut cell = cell.borrow_mut();
        downcast_mut::<K, T>(cell.node_mut()).map(f)
    }

    fn find_of_type<T: NavNode<K>>(&self, ids: impl Iterator<Item = NodeId>) -> Option<NodeId> {
        let state = self.shared.borrow();
        ids.into_iter()
            .find(|&id| downcast_ref::<K, T>(state.cell(id).borrow().node()).is_some())
    }

    /// Key of the nearest node of type `T` on the running path, current
    /// node first.
    pub fn key_in_parent<T: NavNode<K>>(&self) -> Option<K> {
        let running: Vec<NodeId> = self.shared.borrow().running.clone();
        let id = self.find_of_type::<T>(running.into_iter().rev())?;
        Some(self.shared.borrow().key(id).clone())
    }

    pub fn with_node_in_parent<T: NavNode<K>, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let key = self.key_in_parent::<T>()?;
        self.with_node(&key, f)
    }

    /// Key of the nearest node of type `T` among `key` and its ancestors.
    pub fn key_in_path_of<T: NavNode<K>>(&self, key: &K) -> Option<K> {
        let chain = {
            let state = self.shared.borrow();
            let id = *state.registry.get(key)?;
            path::ancestors(|n| state.parent_of(n), id)
        };
        let id = self.find_of_type::<T>(chain.into_iter())?;
        Some(self.shared.borrow().key(id).clone())
    }

    /// Close and reopen the whole running path.
    pub fn reset(&self, request: TransitionRequest<K>) -> Result<TransitionHandle<K>, RequestError> {
        if self.is_transitioning() {
            return Err(RequestError::AlreadyTransitioning);
        }
        match self.current_key() {
            Some(current) => self.transition_to(&current, Direction::Forward, request.refresh()),
            None => Ok(TransitionHandle::empty()),
        }
    }

    /// Start a transition to `key`.
    ///
    /// Requests are rejected while another transition is in flight. Moving
    /// to the current node without `refresh` resolves to an empty handle and
    /// ignores the request's setup and effects.
    pub fn transition_to(
        &self,
        key: &K,
        direction: Direction,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        let TransitionRequest {
            option,
            setup,
            transition,
            effects,
        } = request;

        let (target, transition, handle) = {
            let mut state = self.shared.borrow_mut();
            if state.shut_down {
                return Err(RequestError::ShutDown);
            }
            if state.record.is_some() {
                return Err(RequestError::AlreadyTransitioning);
            }
            let target = state.lookup(key)?;
            if state.current == Some(target) && !option.refresh {
                debug!(target = key.name(), "already current; nothing to do");
                return Ok(TransitionHandle::empty());
            }

            let path = path::plan(|id| state.parent_of(id), state.current, target, option.refresh);
            let transition = Self::choose_transition(&state, &path, key, transition, option.refresh);
            let from = state.current.map(|id| state.key(id).clone());
            let context = TransitionContext::new(from, Some(key.clone()), direction);
            info!(
                from = ?context.from.as_ref().map(|k| k.name().to_string()),
                to = key.name(),
                ?direction,
                kind = ?transition.kind(),
                close = path.close.len(),
                open = path.open.len(),
                "transition started"
            );
            let previous = state.running.clone();
            let record = TransitionRecord::new(target, path, previous, context, effects);
            let handle = record.handle.clone();
            state.record = Some(record);
            (target, transition, handle)
        };

        let routine = self.transition_routine(target, setup, transition);
        let task = self
            .scheduler
            .spawn(Task::new(routine), self.settle_callbacks());
        if let Some(record) = self.shared.borrow_mut().record.as_mut() {
            record.task = Some(task);
        }
        Ok(handle)
    }

    /// Let every node leaving or entering the path adjust the strategy,
    /// then force close-then-open when the two sides overlap.
    fn choose_transition(
        state: &TreeState<K>,
        path: &TransitionPath,
        next: &K,
        requested: Option<TransitionRef>,
        refresh: bool,
    ) -> TransitionRef {
        let mut transition = requested.unwrap_or_else(|| Rc::new(Sequential::new()));
        for &id in path.close.iter().chain(&path.open) {
            transition = state.cell(id).borrow().node().override_transition(next, transition);
        }
        if refresh && transition.kind() != TransitionKind::Sequential {
            let forced: TransitionRef = if transition.is_immediate() {
                Rc::new(Sequential::immediate())
            } else {
                Rc::new(Sequential::new())
            };
            return forced;
        }
        transition
    }

    fn transition_routine(
        &self,
        target: NodeId,
        setup: Option<SetupFn<K>>,
        transition: TransitionRef,
    ) -> crate::task::BoxRoutine {
        let shared = self.shared.clone();
        let resolver: Rc<dyn TransitionResolver> = Rc::new(TreeResolver::new(self.shared.clone()));
        Script::new()
            .call(move || {
                let cell = {
                    let mut state = shared.borrow_mut();
                    state.running = state.path_to(target);
                    state.current = Some(target);
                    state.cell(target).clone()
                };
                if let Some(setup) = setup {
                    setup(cell.borrow_mut().node_mut());
                }
                Ok(())
            })
            .run(move || transition.routine(resolver))
            .boxed()
    }

    fn settle_callbacks(&self) -> TaskCallbacks {
        let (completed, cancelled, faulted) =
            (self.shared.clone(), self.shared.clone(), self.shared.clone());
        TaskCallbacks::new()
            .on_complete(move || Self::settle(&completed, Settled::Completed))
            .on_cancel(move || Self::settle(&cancelled, Settled::Cancelled))
            .on_fault(move |error| Self::settle(&faulted, Settled::Faulted(error)))
    }

    fn settle(shared: &Rc<RefCell<TreeState<K>>>, outcome: Settled) {
        let (record, reached, fault, recovery) = {
            let mut state = shared.borrow_mut();
            let Some(record) = state.record.take() else {
                return;
            };
            let target = state.key(record.target).name().to_string();
            let (reached, fault, recovery) = match outcome {
                Settled::Completed => {
                    info!(
                        to = target,
                        elapsed_ms = record.context.elapsed().as_millis() as u64,
                        "transition completed"
                    );
                    (Some(state.key(record.target).clone()), None, None)
                }
                Settled::Cancelled => {
                    warn!(to = target, "transition cancelled");
                    (None, None, Some(state.recover(&record)))
                }
                Settled::Faulted(fault) => {
                    error!(to = target, error = %fault, "transition faulted");
                    (None, Some(fault), Some(state.recover(&record)))
                }
            };
            (record, reached, fault, recovery)
        };
        if let Some(recovery) = recovery {
            recovery.apply();
        }
        record.handle.finish(reached, fault);
    }

    /// Start loading `key` ahead of time and keep it loaded until
    /// [`cancel_preload`](NavTree::cancel_preload). Repeated calls return
    /// the same handle.
    pub fn preload(&self, key: &K) -> Result<AsyncHandle, RequestError> {
        let (cell, handle) = {
            let mut state = self.shared.borrow_mut();
            if state.shut_down {
                return Err(RequestError::ShutDown);
            }
            let id = state.lookup(key)?;
            if let Some(record) = state.preloads.get(key) {
                return Ok(record.handle.clone());
            }
            let cell = state.cell(id).clone();
            if cell.borrow().phase().is_loaded() {
                let record = PreloadRecord::loaded();
                let handle = record.handle.clone();
                state.preloads.insert(key.clone(), record);
                return Ok(handle);
            }
            let handle = AsyncHandle::new();
            state
                .preloads
                .insert(key.clone(), PreloadRecord::loading(handle.clone()));
            (cell, handle)
        };

        let cx = TransitionContext::preload(key.clone());
        let loading = cell.clone();
        let routine = Script::new()
            .run(move || {
                if loading.borrow().phase() == Phase::Standby {
                    PhaseRoutine::load(loading, &cx)
                } else {
                    routine::wait_until(move || loading.borrow().phase() != Phase::Loading)
                }
            })
            .boxed();
        let task = self
            .scheduler
            .spawn(Task::new(routine), self.preload_callbacks(key, cell, &handle));
        if let Some(record) = self.shared.borrow_mut().preloads.get_mut(key) {
            record.task = Some(task);
        }
        debug!(node = key.name(), "preload started");
        Ok(handle)
    }

    fn preload_callbacks(
        &self,
        key: &K,
        cell: crate::node::SharedCell<K>,
        handle: &AsyncHandle,
    ) -> TaskCallbacks {
        let (done_shared, fault_shared) = (self.shared.clone(), self.shared.clone());
        let (done_key, fault_key) = (key.clone(), key.clone());
        let (done_handle, cancel_handle, fault_handle) =
            (handle.clone(), handle.clone(), handle.clone());
        let done_cell = cell.clone();
        TaskCallbacks::new()
            .on_complete(move || {
                let loaded = done_cell.borrow().phase().is_loaded();
                let mut state = done_shared.borrow_mut();
                if loaded {
                    if let Some(record) = state.preloads.get_mut(&done_key) {
                        record.state = PreloadState::Loaded;
                        record.task = None;
                    }
                    drop(state);
                    done_handle.complete();
                } else {
                    state.preloads.remove(&done_key);
                    drop(state);
                    done_handle.abort(Some("node was unloaded before the preload finished".into()));
                }
            })
            .on_cancel(move || cancel_handle.abort(None))
            .on_fault(move |fault| {
                warn!(node = fault_key.name(), error = %fault, "preload faulted");
                fault_shared.borrow_mut().preloads.remove(&fault_key);
                cell.borrow_mut()
                    .teardown(false, &TransitionContext::preload(fault_key.clone()));
                fault_handle.abort(Some(fault.to_string()));
            })
    }

    /// Drop the retention taken by [`preload`](NavTree::preload).
    ///
    /// A node on the running path, or being opened, keeps its phase; only
    /// the retention is dropped. Otherwise a preload still in flight is
    /// cancelled and the node is unloaded.
    pub fn cancel_preload(&self, key: &K) {
        let (task, cell) = {
            let mut state = self.shared.borrow_mut();
            let Ok(id) = state.lookup(key) else {
                return;
            };
            let in_use = state.running.contains(&id)
                || state
                    .record
                    .as_ref()
                    .is_some_and(|r| r.path.open.contains(&id));
            let Some(record) = state.preloads.remove(key) else {
                return;
            };
            if in_use {
                debug!(node = key.name(), "preload retention dropped for node in use");
                return;
            }
            (record.task, state.cell(id).clone())
        };

        if let Some(task) = task {
            self.scheduler.cancel(task);
        }
        let mut node = cell.borrow_mut();
        if matches!(node.phase(), Phase::Loading | Phase::Loaded) {
            if let Err(error) = node.unload(&TransitionContext::preload(key.clone())) {
                warn!(node = key.name(), error = %error, "unload after cancelled preload failed");
            }
        }
        debug!(node = key.name(), "preload cancelled");
    }

    /// Stop everything and release every node, last declared first.
    /// Idempotent.
    pub fn shutdown(&self) {
        let (transition_task, preload_tasks) = {
            let state = self.shared.borrow();
            if state.shut_down {
                return;
            }
            (
                state.record.as_ref().and_then(|r| r.task),
                state.preloads.values().filter_map(|r| r.task).collect::<Vec<_>>(),
            )
        };
        if let Some(task) = transition_task {
            self.scheduler.cancel(task);
        }
        for task in preload_tasks {
            self.scheduler.cancel(task);
        }

        let (cells, leftover) = {
            let mut state = self.shared.borrow_mut();
            state.shut_down = true;
            state.preloads.clear();
            state.running.clear();
            state.current = None;
            (state.cells.clone(), state.record.take())
        };
        if let Some(record) = leftover {
            record.handle.finish(None, None);
        }
        for cell in cells.iter().rev() {
            cell.borrow_mut().shutdown();
        }
        info!("navigation tree shut down");
    }
}

impl<K: NodeKey> fmt::Debug for NavTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavTree")
            .field("current", &self.current_key())
            .field("transitioning", &self.is_transitioning())
            .finish()
    }
}
