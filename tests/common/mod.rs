//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use waymark::node_keys;
use waymark::prelude::*;
use waymark::transition::{for_kind, TransitionRef};

node_keys! {
    pub enum Key {
        Root,
        SessionA,
        ScreenX,
        ScreenY,
        ScreenW,
        SessionB,
        ScreenZ,
        Orphan,
    }
}

/// Hook calls in the order they happened, as `"Node.hook"`.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    /// Entries for one node, hook names only.
    pub fn of(&self, key: Key) -> Vec<String> {
        let prefix = format!("{}.", key.name());
        self.0
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// Position of `entry` in the log.
    pub fn index_of(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }
}

/// Filled in once the tree is built, for nodes that query it from hooks.
pub type TreeSlot = Rc<RefCell<Option<NavTree<Key>>>>;

/// A node that records every hook call.
pub struct Recorder {
    name: String,
    log: Log,
    load_ticks: usize,
    open_ticks: usize,
    fail_on: Option<&'static str>,
    forced: Option<TransitionKind>,
    watch: Option<TreeSlot>,
    pub focused: bool,
    pub blurs: usize,
    pub visits: usize,
}

impl Recorder {
    pub fn new(key: Key, log: &Log) -> Self {
        Self {
            name: key.name().to_string(),
            log: log.clone(),
            load_ticks: 0,
            open_ticks: 0,
            fail_on: None,
            forced: None,
            watch: None,
            focused: false,
            blurs: 0,
            visits: 0,
        }
    }

    pub fn loading_for(mut self, ticks: usize) -> Self {
        self.load_ticks = ticks;
        self
    }

    pub fn opening_for(mut self, ticks: usize) -> Self {
        self.open_ticks = ticks;
        self
    }

    pub fn failing(mut self, hook: &'static str) -> Self {
        self.fail_on = Some(hook);
        self
    }

    pub fn forcing(mut self, kind: TransitionKind) -> Self {
        self.forced = Some(kind);
        self
    }

    /// Also log what the tree reports as current on every hook.
    pub fn watching(mut self, slot: &TreeSlot) -> Self {
        self.watch = Some(slot.clone());
        self
    }

    fn hit(&self, hook: &str) -> HookResult {
        self.log.push(format!("{}.{}", self.name, hook));
        if let Some(tree) = self.watch.as_ref().and_then(|slot| slot.borrow().clone()) {
            let current = tree.current_key();
            self.log
                .push(format!("{}.{} sees {:?}", self.name, hook, current));
        }
        if self.fail_on == Some(hook) {
            return Err(NodeFault::new(format!("{} failed in {}", self.name, hook)));
        }
        Ok(())
    }

    fn timed(&self, hook: &str, ticks: usize) -> BoxRoutine {
        match self.hit(hook) {
            Ok(()) => routine::ticks(ticks),
            Err(fault) => routine::fail(fault),
        }
    }
}

impl NavNode<Key> for Recorder {
    fn set_focus(&mut self, focused: bool) {
        if !focused {
            self.blurs += 1;
        }
        self.focused = focused;
    }

    fn override_transition(&self, _next: &Key, transition: TransitionRef) -> TransitionRef {
        match self.forced {
            Some(kind) => for_kind(kind, transition.is_immediate()),
            None => transition,
        }
    }

    fn standby(&mut self, _scope: &Scope) -> HookResult {
        self.hit("standby")
    }

    fn load(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
        self.timed("load", self.load_ticks)
    }

    fn initialize(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
        self.timed("initialize", 0)
    }

    fn activate(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> HookResult {
        self.visits += 1;
        self.hit("activate")
    }

    fn deactivate(&mut self, _cx: &TransitionContext<Key>) -> HookResult {
        self.hit("deactivate")
    }

    fn terminate(&mut self, _cx: &TransitionContext<Key>) -> HookResult {
        self.hit("terminate")
    }

    fn unload(&mut self, _cx: &TransitionContext<Key>) -> HookResult {
        self.hit("unload")
    }

    fn release(&mut self) {
        let _ = self.hit("release");
    }

    fn shutdown(&mut self) {
        let _ = self.hit("shutdown");
    }

    fn pre_open(&mut self, _cx: &TransitionContext<Key>) -> HookResult {
        self.hit("pre_open")
    }

    fn open(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
        self.timed("open", self.open_ticks)
    }

    fn post_open(&mut self, _cx: &TransitionContext<Key>) -> HookResult {
        self.hit("post_open")
    }

    fn pre_close(&mut self, _cx: &TransitionContext<Key>) -> HookResult {
        self.hit("pre_close")
    }

    fn close(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
        self.timed("close", 0)
    }

    fn post_close(&mut self, _cx: &TransitionContext<Key>) -> HookResult {
        self.hit("post_close")
    }
}

/// Root → SessionA → {ScreenX, ScreenY, ScreenW}, Root → SessionB → {ScreenZ}.
///
/// `customize` can adjust any node before it is registered.
pub fn tree_with(log: &Log, customize: impl Fn(Key, Recorder) -> Recorder) -> TreeBuilder<Key> {
    let node = |key: Key| customize(key, Recorder::new(key, log));
    TreeBuilder::root(Key::Root, node(Key::Root), |root| {
        root.session(Key::SessionA, node(Key::SessionA), |a| {
            a.screen(Key::ScreenX, node(Key::ScreenX));
            a.screen(Key::ScreenY, node(Key::ScreenY));
            a.screen(Key::ScreenW, node(Key::ScreenW));
        });
        root.session(Key::SessionB, node(Key::SessionB), |b| {
            b.screen(Key::ScreenZ, node(Key::ScreenZ));
        });
    })
}

pub fn scenario_tree(log: &Log) -> TreeBuilder<Key> {
    tree_with(log, |_, node| node)
}

/// Tick until nothing is transitioning. Panics if that takes too long.
pub fn settle(tree: &NavTree<Key>) {
    for _ in 0..200 {
        if !tree.is_transitioning() {
            return;
        }
        tree.update();
    }
    panic!("transition did not settle");
}

/// Tick until the scheduler has nothing left to run.
pub fn drain(tree: &NavTree<Key>) {
    for _ in 0..200 {
        if tree.scheduler().is_empty() && !tree.is_transitioning() {
            return;
        }
        tree.update();
    }
    panic!("scheduler did not drain");
}

pub fn go(tree: &NavTree<Key>, key: Key) -> TransitionHandle<Key> {
    let handle = tree
        .transition_to(&key, Direction::Forward, TransitionRequest::new())
        .unwrap();
    settle(tree);
    handle
}
