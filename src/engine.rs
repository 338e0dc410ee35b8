//! The navigation engine facade.
//!
//! [`NavigationEngine`] bundles a [`NavTree`], an optional [`Router`] and a
//! [`NavigationJournal`]. Applications usually hold one engine and call
//! [`update`](NavigationEngine::update) once per frame.

use crate::checkpoint::RouterCheckpoint;
use crate::config::EngineOptions;
use crate::error::{BuildError, CheckpointError, ConfigError, RequestError};
use crate::node::{NavNode, NodeKey, NodeKind, Phase};
use crate::router::{
    JournalEntry, NavigationJournal, Router, StackRouter, TreeRouterBuilder,
};
use crate::task::AsyncHandle;
use crate::transition::{Direction, TransitionHandle, TransitionRequest};
use crate::tree::{NavTree, PreloadState, TreeBuilder};
use chrono::Utc;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

type RouterFactory<K> = Box<dyn FnOnce(NavTree<K>) -> Result<Box<dyn Router<K>>, BuildError>>;

/// Builder for [`NavigationEngine`].
pub struct NavigationEngineBuilder<K: NodeKey> {
    tree: Option<TreeBuilder<K>>,
    router: Option<RouterFactory<K>>,
    options: EngineOptions,
}

impl<K: NodeKey> Default for NavigationEngineBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> NavigationEngineBuilder<K> {
    pub fn new() -> Self {
        Self {
            tree: None,
            router: None,
            options: EngineOptions::default(),
        }
    }

    /// Set the node tree (required).
    pub fn tree(mut self, tree: TreeBuilder<K>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Install a router built from the finished tree.
    pub fn router<R, F>(mut self, factory: F) -> Self
    where
        R: Router<K> + 'static,
        F: FnOnce(NavTree<K>) -> Result<R, BuildError> + 'static,
    {
        self.router = Some(Box::new(move |tree| {
            factory(tree).map(|router| Box::new(router) as Box<dyn Router<K>>)
        }));
        self
    }

    pub fn stack_router(self) -> Self {
        self.router(|tree| Ok(StackRouter::new(tree)))
    }

    pub fn tree_router(self, routes: TreeRouterBuilder<K>) -> Self {
        self.router(move |tree| routes.build(tree))
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the engine. Tree and router configuration errors are reported
    /// together.
    pub fn build(self) -> Result<NavigationEngine<K>, BuildError> {
        let tree_builder = self.tree.ok_or(ConfigError::MissingTree)?;
        self.options.validate()?;
        let tree = tree_builder.build()?;
        let router = match self.router {
            Some(factory) => Some(factory(tree.clone())?),
            None => None,
        };
        let journal = NavigationJournal::with_capacity(self.options.journal_capacity);
        Ok(NavigationEngine {
            tree,
            router,
            journal: Rc::new(RefCell::new(journal)),
            options: self.options,
        })
    }
}

/// A navigation tree with its router and journal.
///
/// Dropping the engine shuts the tree down.
pub struct NavigationEngine<K: NodeKey> {
    tree: NavTree<K>,
    router: Option<Box<dyn Router<K>>>,
    journal: Rc<RefCell<NavigationJournal<K>>>,
    options: EngineOptions,
}

impl<K: NodeKey> NavigationEngine<K> {
    pub fn builder() -> NavigationEngineBuilder<K> {
        NavigationEngineBuilder::new()
    }

    pub fn tree(&self) -> &NavTree<K> {
        &self.tree
    }

    pub fn router(&self) -> Option<&dyn Router<K>> {
        self.router.as_deref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Snapshot of the journal.
    pub fn journal(&self) -> NavigationJournal<K> {
        self.journal.borrow().clone()
    }

    /// Advance every running transition and preload by one tick.
    pub fn update(&self) {
        self.tree.update();
    }

    /// The node the tree is on. After a transition that did not arrive
    /// this is the recovered node, which may differ from the router's
    /// last position.
    pub fn current_key(&self) -> Option<K> {
        self.tree.current_key()
    }

    pub fn is_transitioning(&self) -> bool {
        self.tree.is_transitioning()
    }

    pub fn transition_to(
        &mut self,
        key: &K,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        let request = self.with_defaults(request);
        let from = self.tree.current_key();
        let handle = match self.router.as_mut() {
            Some(router) => router.transition_to(key, request)?,
            None => self.tree.transition_to(key, Direction::Forward, request)?,
        };
        self.journal_on_finish(&handle, from, Direction::Forward);
        Ok(handle)
    }

    /// Go back `depth` steps through the router's history.
    pub fn back(
        &mut self,
        depth: usize,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, RequestError> {
        let request = self.with_defaults(request);
        let from = self.tree.current_key();
        let router = self.router.as_mut().ok_or(RequestError::RouterMissing)?;
        let handle = router.back(depth, request)?;
        self.journal_on_finish(&handle, from, Direction::Back);
        Ok(handle)
    }

    /// Close and reopen the current path.
    pub fn reset(&mut self, request: TransitionRequest<K>) -> Result<TransitionHandle<K>, RequestError> {
        let request = self.with_defaults(request);
        match self.router.as_mut() {
            Some(router) => router.reset(request),
            None => self.tree.reset(request),
        }
    }

    pub fn preload(&self, key: &K) -> Result<AsyncHandle, RequestError> {
        self.tree.preload(key)
    }

    pub fn cancel_preload(&self, key: &K) {
        self.tree.cancel_preload(key);
    }

    pub fn preload_state(&self, key: &K) -> PreloadState {
        self.tree.preload_state(key)
    }

    pub fn shutdown(&self) {
        self.tree.shutdown();
    }

    pub fn contains_in_path(&self, key: &K) -> bool {
        self.tree.contains_in_path(key)
    }

    pub fn phase_of(&self, key: &K) -> Option<Phase> {
        self.tree.phase_of(key)
    }

    pub fn kind_of(&self, key: &K) -> Option<NodeKind> {
        self.tree.kind_of(key)
    }

    /// Key of the nearest `T` on the running path.
    pub fn key_in_parent<T: NavNode<K>>(&self) -> Option<K> {
        self.tree.key_in_parent::<T>()
    }

    pub fn with_node_in_parent<T: NavNode<K>, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.tree.with_node_in_parent(f)
    }

    pub fn with_node<T: NavNode<K>, R>(&self, key: &K, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.tree.with_node(key, f)
    }

    pub fn with_node_mut<T: NavNode<K>, R>(
        &self,
        key: &K,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        self.tree.with_node_mut(key, f)
    }

    /// Key of the nearest `T` on the path that `back(1)` would open.
    pub fn back_key_in_parent<T: NavNode<K>>(&self) -> Option<K> {
        let back = self.router.as_ref()?.back_key(1)?;
        self.tree.key_in_path_of::<T>(&back)
    }

    /// Capture the router's history.
    pub fn checkpoint(&self) -> Result<RouterCheckpoint<K>, RequestError> {
        let router = self.router.as_deref().ok_or(RequestError::RouterMissing)?;
        Ok(RouterCheckpoint::capture(router))
    }

    /// Restore a checkpoint's history and transition to its position.
    /// An empty checkpoint resolves to an empty handle.
    pub fn restore(
        &mut self,
        checkpoint: &RouterCheckpoint<K>,
        request: TransitionRequest<K>,
    ) -> Result<TransitionHandle<K>, CheckpointError> {
        let router = self.router.as_deref_mut().ok_or(RequestError::RouterMissing)?;
        if router.is_transitioning() {
            return Err(RequestError::AlreadyTransitioning.into());
        }
        match checkpoint.restore(router)? {
            Some(key) => {
                debug!(to = key.name(), checkpoint = %checkpoint.id, "resuming from checkpoint");
                Ok(self.transition_to(&key, request)?)
            }
            None => Ok(TransitionHandle::empty()),
        }
    }

    fn with_defaults(&self, mut request: TransitionRequest<K>) -> TransitionRequest<K> {
        if request.transition.is_none() {
            request.transition = Some(self.options.default_transition_ref());
        }
        request
    }

    fn journal_on_finish(&self, handle: &TransitionHandle<K>, from: Option<K>, direction: Direction) {
        if handle.is_empty() {
            return;
        }
        let journal = self.journal.clone();
        handle.on_finished(move |reached| {
            let entry = JournalEntry {
                from,
                to: reached.cloned(),
                direction,
                timestamp: Utc::now(),
            };
            let next = journal.borrow().record(entry);
            *journal.borrow_mut() = next;
        });
    }
}

impl<K: NodeKey> Drop for NavigationEngine<K> {
    fn drop(&mut self) {
        self.tree.shutdown();
    }
}

impl<K: NodeKey> fmt::Debug for NavigationEngine<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("current", &self.current_key())
            .field("transitioning", &self.is_transitioning())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::EmptyNode;
    use crate::transition::TransitionKind;

    fn key(name: &str) -> String {
        name.to_string()
    }

    fn tree() -> TreeBuilder<String> {
        TreeBuilder::root(key("Root"), EmptyNode, |root| {
            root.session(key("Out"), EmptyNode, |out| {
                out.screen(key("Home"), EmptyNode);
                out.screen(key("Shop"), EmptyNode);
            });
        })
    }

    fn settle(engine: &NavigationEngine<String>) {
        for _ in 0..100 {
            if !engine.is_transitioning() {
                return;
            }
            engine.update();
        }
        panic!("transition did not settle");
    }

    #[test]
    fn build_requires_tree() {
        let result = NavigationEngine::<String>::builder().build();

        let error = result.unwrap_err();
        assert_eq!(error.errors(), &[ConfigError::MissingTree]);
    }

    #[test]
    fn build_rejects_custom_default_transition() {
        let options = EngineOptions::default().with_default_transition(TransitionKind::Custom);

        let result = NavigationEngine::builder().tree(tree()).options(options).build();

        assert!(matches!(
            result.unwrap_err().errors(),
            [ConfigError::InvalidOptions(_)]
        ));
    }

    #[test]
    fn back_without_router_is_rejected() {
        let mut engine = NavigationEngine::builder().tree(tree()).build().unwrap();

        let result = engine.back(1, TransitionRequest::new());

        assert!(matches!(result, Err(RequestError::RouterMissing)));
    }

    #[test]
    fn transitions_without_router_go_straight_to_the_tree() {
        let mut engine = NavigationEngine::builder().tree(tree()).build().unwrap();

        let handle = engine.transition_to(&key("Home"), TransitionRequest::new()).unwrap();
        settle(&engine);

        assert_eq!(handle.result(), Some(key("Home")));
        assert_eq!(engine.current_key(), Some(key("Home")));
        assert!(engine.contains_in_path(&key("Out")));
    }

    #[test]
    fn journal_records_finished_transitions() {
        let mut engine = NavigationEngine::builder()
            .tree(tree())
            .stack_router()
            .build()
            .unwrap();

        engine.transition_to(&key("Home"), TransitionRequest::new()).unwrap();
        settle(&engine);
        engine.transition_to(&key("Shop"), TransitionRequest::new()).unwrap();
        settle(&engine);
        engine.back(1, TransitionRequest::new()).unwrap();
        settle(&engine);

        let journal = engine.journal();
        let path: Vec<&str> = journal.get_path().into_iter().map(String::as_str).collect();
        assert_eq!(path, vec!["Home", "Shop", "Home"]);
        assert_eq!(journal.entries()[2].direction, Direction::Back);
    }

    #[test]
    fn journal_capacity_comes_from_options() {
        let mut engine = NavigationEngine::builder()
            .tree(tree())
            .stack_router()
            .options(EngineOptions::default().with_journal_capacity(1))
            .build()
            .unwrap();

        engine.transition_to(&key("Home"), TransitionRequest::new()).unwrap();
        settle(&engine);
        engine.transition_to(&key("Shop"), TransitionRequest::new()).unwrap();
        settle(&engine);

        let journal = engine.journal();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.entries()[0].to, Some(key("Shop")));
    }
}
