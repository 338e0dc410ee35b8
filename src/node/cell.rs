//! Per-node lifecycle bookkeeping.
//!
//! A [`NodeCell`] wraps a user node and guards every phase method: hooks are
//! only invoked when the node is in a phase that allows them, and each phase
//! gets its own [`Scope`] that is disposed when the phase is left.

use super::{NavNode, NodeKey, NodeKind, Phase, Scope, Teardown};
use crate::error::{LifecycleError, NodeFault, TaskError};
use crate::task::{routine, BoxRoutine, Routine, Task, Yield};
use crate::transition::TransitionContext;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// Arena index of a node inside its tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

pub(crate) type SharedCell<K> = Rc<RefCell<NodeCell<K>>>;

#[derive(Default)]
struct PhaseScopes {
    standby: Option<Scope>,
    load: Option<Scope>,
    initialize: Option<Scope>,
    activate: Option<Scope>,
    animation: Option<Scope>,
}

fn open_scope(slot: &mut Option<Scope>) -> Scope {
    close_scope(slot);
    let scope = Scope::new();
    *slot = Some(scope.clone());
    scope
}

fn close_scope(slot: &mut Option<Scope>) {
    if let Some(scope) = slot.take() {
        scope.dispose();
    }
}

pub(crate) struct NodeCell<K: NodeKey> {
    key: K,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node: Box<dyn NavNode<K>>,
    phase: Phase,
    opened: bool,
    scopes: PhaseScopes,
}

impl<K: NodeKey> NodeCell<K> {
    pub fn new(key: K, kind: NodeKind, parent: Option<NodeId>, node: Box<dyn NavNode<K>>) -> Self {
        Self {
            key,
            kind,
            parent,
            children: Vec::new(),
            node,
            phase: Phase::Created,
            opened: false,
            scopes: PhaseScopes::default(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn node(&self) -> &dyn NavNode<K> {
        &*self.node
    }

    pub fn node_mut(&mut self) -> &mut dyn NavNode<K> {
        &mut *self.node
    }

    /// Loads alone rather than in a parallel group with sibling screens.
    pub fn loads_alone(&self) -> bool {
        self.kind.loads_alone() || !self.node.parallel_loading()
    }

    fn guard(&self, operation: &'static str, allowed: &[Phase]) -> Result<(), TaskError> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        Err(LifecycleError::InvalidPhaseTransition {
            key: self.key.name().to_string(),
            operation,
            phase: self.phase,
        }
        .into())
    }

    fn fault(&self, operation: &'static str, fault: NodeFault) -> TaskError {
        TaskError::Phase {
            key: self.key.name().to_string(),
            operation,
            fault,
        }
    }

    pub fn enter_standby(&mut self) -> Result<(), TaskError> {
        self.guard("enter standby", &[Phase::Created])?;
        let scope = open_scope(&mut self.scopes.standby);
        self.phase = Phase::Standby;
        self.node
            .standby(&scope)
            .map_err(|fault| self.fault("standby", fault))
    }

    pub fn begin_load(&mut self, cx: &TransitionContext<K>) -> Result<BoxRoutine, TaskError> {
        self.guard("load", &[Phase::Standby])?;
        let scope = open_scope(&mut self.scopes.load);
        self.phase = Phase::Loading;
        Ok(self.node.load(cx, &scope))
    }

    pub fn finish_load(&mut self) -> Result<(), TaskError> {
        self.guard("finish loading", &[Phase::Loading])?;
        self.phase = Phase::Loaded;
        Ok(())
    }

    pub fn begin_initialize(&mut self, cx: &TransitionContext<K>) -> Result<BoxRoutine, TaskError> {
        self.guard("initialize", &[Phase::Loaded])?;
        let scope = open_scope(&mut self.scopes.initialize);
        self.phase = Phase::Initializing;
        Ok(self.node.initialize(cx, &scope))
    }

    pub fn finish_initialize(&mut self) -> Result<(), TaskError> {
        self.guard("finish initializing", &[Phase::Initializing])?;
        self.phase = Phase::Initialized;
        Ok(())
    }

    pub fn activate(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        self.guard("activate", &[Phase::Initialized])?;
        let scope = open_scope(&mut self.scopes.activate);
        match self.node.activate(cx, &scope) {
            Ok(()) => {
                self.phase = Phase::Active;
                Ok(())
            }
            Err(fault) => {
                close_scope(&mut self.scopes.activate);
                Err(self.fault("activate", fault))
            }
        }
    }

    // Exits always land in the lower phase, even when the hook faults.

    pub fn deactivate(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        self.guard("deactivate", &[Phase::Active])?;
        let result = self.node.deactivate(cx);
        close_scope(&mut self.scopes.activate);
        self.phase = Phase::Initialized;
        result.map_err(|fault| self.fault("deactivate", fault))
    }

    pub fn terminate(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        self.guard("terminate", &[Phase::Initializing, Phase::Initialized])?;
        let result = self.node.terminate(cx);
        close_scope(&mut self.scopes.initialize);
        self.phase = Phase::Loaded;
        result.map_err(|fault| self.fault("terminate", fault))
    }

    pub fn unload(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        self.guard("unload", &[Phase::Loading, Phase::Loaded])?;
        let result = self.node.unload(cx);
        close_scope(&mut self.scopes.load);
        self.phase = Phase::Standby;
        result.map_err(|fault| self.fault("unload", fault))
    }

    pub fn release(&mut self) -> Result<(), TaskError> {
        self.guard("release", &[Phase::Standby])?;
        self.node.release();
        close_scope(&mut self.scopes.standby);
        self.phase = Phase::Released;
        Ok(())
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.node.set_focus(focused);
    }

    pub fn pre_open(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        open_scope(&mut self.scopes.animation);
        self.node
            .pre_open(cx)
            .map_err(|fault| self.fault("pre-open", fault))
    }

    pub fn open(&mut self, cx: &TransitionContext<K>) -> BoxRoutine {
        let scope = self.scopes.animation.clone().unwrap_or_default();
        self.node.open(cx, &scope)
    }

    pub fn post_open(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        close_scope(&mut self.scopes.animation);
        self.opened = true;
        self.node
            .post_open(cx)
            .map_err(|fault| self.fault("post-open", fault))
    }

    pub fn pre_close(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        self.opened = false;
        open_scope(&mut self.scopes.animation);
        self.node
            .pre_close(cx)
            .map_err(|fault| self.fault("pre-close", fault))
    }

    pub fn close(&mut self, cx: &TransitionContext<K>) -> BoxRoutine {
        let scope = self.scopes.animation.clone().unwrap_or_default();
        self.node.close(cx, &scope)
    }

    pub fn post_close(&mut self, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        close_scope(&mut self.scopes.animation);
        self.node
            .post_close(cx)
            .map_err(|fault| self.fault("post-close", fault))
    }

    fn run_teardown(&mut self, step: Teardown, cx: &TransitionContext<K>) -> Result<(), TaskError> {
        match step {
            Teardown::Deactivate => self.deactivate(cx),
            Teardown::Terminate => self.terminate(cx),
            Teardown::Unload => self.unload(cx),
            Teardown::Release => self.release(),
        }
    }

    /// Abort any choreography in flight and close the screen if it is open.
    fn close_abruptly(&mut self, cx: &TransitionContext<K>) {
        close_scope(&mut self.scopes.animation);
        if !self.opened {
            return;
        }
        self.opened = false;
        if let Err(fault) = self.node.pre_close(cx) {
            warn!(node = self.key.name(), error = %fault, "pre-close failed during teardown");
        }
        if let Err(fault) = self.node.post_close(cx) {
            warn!(node = self.key.name(), error = %fault, "post-close failed during teardown");
        }
    }

    /// Best-effort teardown down to `Standby`, or to `Loaded` when
    /// `keep_loaded` is set and the node finished loading.
    pub fn teardown(&mut self, keep_loaded: bool, cx: &TransitionContext<K>) {
        self.close_abruptly(cx);
        let keep_loaded = keep_loaded && self.phase.is_loaded();
        for &step in self.phase.teardown_path() {
            if step == Teardown::Release || (keep_loaded && step == Teardown::Unload) {
                break;
            }
            if let Err(error) = self.run_teardown(step, cx) {
                warn!(node = self.key.name(), ?step, error = %error, "teardown step failed");
            }
        }
    }

    /// Release the node from whatever phase it is in. Only the exits of
    /// phases that were entered run. Idempotent.
    pub fn shutdown(&mut self) {
        if self.phase == Phase::Released {
            return;
        }
        let cx = TransitionContext::detached();
        self.close_abruptly(&cx);
        self.node.shutdown();
        for &step in self.phase.teardown_path() {
            if let Err(error) = self.run_teardown(step, &cx) {
                warn!(node = self.key.name(), ?step, error = %error, "shutdown step failed");
            }
        }
        self.phase = Phase::Released;
    }
}

type Finish<K> = Box<dyn FnOnce(&mut NodeCell<K>) -> Result<(), TaskError>>;

/// Drives a node routine and completes the phase when it finishes. Faults
/// raised by the routine are tagged with the node key and operation.
pub(crate) struct PhaseRoutine<K: NodeKey> {
    cell: SharedCell<K>,
    inner: Task,
    operation: &'static str,
    finish: Option<Finish<K>>,
}

impl<K: NodeKey> PhaseRoutine<K> {
    fn boxed(cell: SharedCell<K>, inner: BoxRoutine, operation: &'static str, finish: Finish<K>) -> BoxRoutine {
        Box::new(Self {
            cell,
            inner: Task::new(inner),
            operation,
            finish: Some(finish),
        })
    }

    pub fn load(cell: SharedCell<K>, cx: &TransitionContext<K>) -> BoxRoutine {
        let started = cell.borrow_mut().begin_load(cx);
        match started {
            Ok(inner) => Self::boxed(cell, inner, "load", Box::new(NodeCell::<K>::finish_load)),
            Err(error) => routine::fail(error),
        }
    }

    pub fn initialize(cell: SharedCell<K>, cx: &TransitionContext<K>) -> BoxRoutine {
        let started = cell.borrow_mut().begin_initialize(cx);
        match started {
            Ok(inner) => Self::boxed(cell, inner, "initialize", Box::new(NodeCell::<K>::finish_initialize)),
            Err(error) => routine::fail(error),
        }
    }

    /// Pre-open, the open animation (skipped when immediate), post-open.
    pub fn open(cell: SharedCell<K>, cx: &TransitionContext<K>, immediate: bool) -> BoxRoutine {
        let started = {
            let mut node = cell.borrow_mut();
            node.pre_open(cx).map(|()| {
                if immediate {
                    routine::done()
                } else {
                    node.open(cx)
                }
            })
        };
        let cx = cx.clone();
        match started {
            Ok(inner) => Self::boxed(cell, inner, "open", Box::new(move |node| node.post_open(&cx))),
            Err(error) => routine::fail(error),
        }
    }

    /// Pre-close, the close animation (skipped when immediate), post-close.
    pub fn close(cell: SharedCell<K>, cx: &TransitionContext<K>, immediate: bool) -> BoxRoutine {
        let started = {
            let mut node = cell.borrow_mut();
            node.pre_close(cx).map(|()| {
                if immediate {
                    routine::done()
                } else {
                    node.close(cx)
                }
            })
        };
        let cx = cx.clone();
        match started {
            Ok(inner) => Self::boxed(cell, inner, "close", Box::new(move |node| node.post_close(&cx))),
            Err(error) => routine::fail(error),
        }
    }
}

impl<K: NodeKey> Routine for PhaseRoutine<K> {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        match self.inner.advance() {
            Ok(true) => Ok(Some(Yield::Tick)),
            Ok(false) => {
                if let Some(finish) = self.finish.take() {
                    let mut cell = self.cell.borrow_mut();
                    finish(&mut *cell)?;
                }
                Ok(None)
            }
            Err(error) => {
                let key = self.cell.borrow().key().name().to_string();
                Err(error.in_phase(&key, self.operation))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HookResult;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct Recorder {
        log: Log,
        fail_activate: bool,
        load_ticks: usize,
    }

    impl Recorder {
        fn new(log: &Log) -> Self {
            Self {
                log: log.clone(),
                fail_activate: false,
                load_ticks: 0,
            }
        }
    }

    impl NavNode<String> for Recorder {
        fn standby(&mut self, _scope: &Scope) -> HookResult {
            self.log.borrow_mut().push("standby");
            Ok(())
        }

        fn load(&mut self, _cx: &TransitionContext<String>, _scope: &Scope) -> BoxRoutine {
            self.log.borrow_mut().push("load");
            routine::ticks(self.load_ticks)
        }

        fn initialize(&mut self, _cx: &TransitionContext<String>, _scope: &Scope) -> BoxRoutine {
            self.log.borrow_mut().push("initialize");
            routine::done()
        }

        fn activate(&mut self, _cx: &TransitionContext<String>, _scope: &Scope) -> HookResult {
            self.log.borrow_mut().push("activate");
            if self.fail_activate {
                return Err(NodeFault::new("activation refused"));
            }
            Ok(())
        }

        fn deactivate(&mut self, _cx: &TransitionContext<String>) -> HookResult {
            self.log.borrow_mut().push("deactivate");
            Ok(())
        }

        fn terminate(&mut self, _cx: &TransitionContext<String>) -> HookResult {
            self.log.borrow_mut().push("terminate");
            Ok(())
        }

        fn unload(&mut self, _cx: &TransitionContext<String>) -> HookResult {
            self.log.borrow_mut().push("unload");
            Ok(())
        }

        fn release(&mut self) {
            self.log.borrow_mut().push("release");
        }
    }

    fn shared(recorder: Recorder) -> SharedCell<String> {
        Rc::new(RefCell::new(NodeCell::new(
            "Home".to_string(),
            NodeKind::Screen,
            None,
            Box::new(recorder),
        )))
    }

    fn run(routine: BoxRoutine) -> Result<usize, TaskError> {
        let mut task = Task::new(routine);
        let mut ticks = 0;
        while task.advance()? {
            ticks += 1;
        }
        Ok(ticks)
    }

    fn bring_up(cell: &SharedCell<String>) {
        let cx = TransitionContext::detached();
        cell.borrow_mut().enter_standby().unwrap();
        run(PhaseRoutine::load(cell.clone(), &cx)).unwrap();
        run(PhaseRoutine::initialize(cell.clone(), &cx)).unwrap();
        cell.borrow_mut().activate(&cx).unwrap();
    }

    #[test]
    fn shutdown_from_active_runs_each_exit_once() {
        let log = Log::default();
        let cell = shared(Recorder::new(&log));
        bring_up(&cell);
        log.borrow_mut().clear();

        cell.borrow_mut().shutdown();
        cell.borrow_mut().shutdown();

        assert_eq!(
            *log.borrow(),
            vec!["deactivate", "terminate", "unload", "release"]
        );
        assert_eq!(cell.borrow().phase(), Phase::Released);
    }

    #[test]
    fn load_routine_completes_phase_after_ticks() {
        let log = Log::default();
        let mut recorder = Recorder::new(&log);
        recorder.load_ticks = 2;
        let cell = shared(recorder);
        cell.borrow_mut().enter_standby().unwrap();

        let mut task = Task::new(PhaseRoutine::load(cell.clone(), &TransitionContext::detached()));
        assert!(task.advance().unwrap());
        assert_eq!(cell.borrow().phase(), Phase::Loading);
        assert!(task.advance().unwrap());
        assert!(!task.advance().unwrap());
        assert_eq!(cell.borrow().phase(), Phase::Loaded);
    }

    #[test]
    fn out_of_order_call_is_rejected() {
        let log = Log::default();
        let cell = shared(Recorder::new(&log));
        cell.borrow_mut().enter_standby().unwrap();

        let result = cell.borrow_mut().activate(&TransitionContext::detached());

        assert!(matches!(
            result,
            Err(TaskError::Lifecycle(LifecycleError::InvalidPhaseTransition {
                operation: "activate",
                phase: Phase::Standby,
                ..
            }))
        ));
        assert!(!log.borrow().contains(&"activate"));
    }

    #[test]
    fn failed_activation_stays_initialized() {
        let log = Log::default();
        let mut recorder = Recorder::new(&log);
        recorder.fail_activate = true;
        let cell = shared(recorder);
        let cx = TransitionContext::detached();
        cell.borrow_mut().enter_standby().unwrap();
        run(PhaseRoutine::load(cell.clone(), &cx)).unwrap();
        run(PhaseRoutine::initialize(cell.clone(), &cx)).unwrap();

        let error = cell.borrow_mut().activate(&cx).unwrap_err();

        assert!(matches!(error, TaskError::Phase { operation: "activate", .. }));
        assert_eq!(cell.borrow().phase(), Phase::Initialized);
    }

    #[test]
    fn teardown_can_keep_a_loaded_node() {
        let log = Log::default();
        let cell = shared(Recorder::new(&log));
        bring_up(&cell);
        log.borrow_mut().clear();

        cell.borrow_mut().teardown(true, &TransitionContext::detached());

        assert_eq!(*log.borrow(), vec!["deactivate", "terminate"]);
        assert_eq!(cell.borrow().phase(), Phase::Loaded);
    }

    #[test]
    fn shutdown_from_created_runs_nothing() {
        let log = Log::default();
        let cell = shared(Recorder::new(&log));
        cell.borrow_mut().shutdown();
        assert!(log.borrow().is_empty());
        assert_eq!(cell.borrow().phase(), Phase::Released);
    }

    #[test]
    fn load_scope_is_disposed_on_unload() {
        struct ScopedLoad(Rc<RefCell<bool>>);
        impl NavNode<String> for ScopedLoad {
            fn load(&mut self, _cx: &TransitionContext<String>, scope: &Scope) -> BoxRoutine {
                let flag = self.0.clone();
                scope.defer(move || *flag.borrow_mut() = true);
                routine::done()
            }
        }

        let disposed = Rc::new(RefCell::new(false));
        let cell: SharedCell<String> = Rc::new(RefCell::new(NodeCell::new(
            "Home".to_string(),
            NodeKind::Screen,
            None,
            Box::new(ScopedLoad(disposed.clone())),
        )));
        let cx = TransitionContext::detached();
        cell.borrow_mut().enter_standby().unwrap();
        run(PhaseRoutine::load(cell.clone(), &cx)).unwrap();
        assert!(!*disposed.borrow());

        cell.borrow_mut().unload(&cx).unwrap();
        assert!(*disposed.borrow());
    }
}
