//! Declarative construction of a navigation tree.

use super::NavTree;
use crate::error::{accumulate, check, BuildError, ConfigCheck, ConfigError};
use crate::node::{NavNode, NodeCell, NodeId, NodeKey, NodeKind};
use std::collections::HashMap;

/// A node declaration and its children.
pub struct NodeSpec<K: NodeKey> {
    key: K,
    kind: NodeKind,
    node: Box<dyn NavNode<K>>,
    children: Vec<NodeSpec<K>>,
}

impl<K: NodeKey> NodeSpec<K> {
    fn new(key: K, kind: NodeKind, node: Box<dyn NavNode<K>>) -> Self {
        Self {
            key,
            kind,
            node,
            children: Vec::new(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Declare a child of any kind. Containment is checked at build time.
    pub fn child(
        &mut self,
        kind: NodeKind,
        key: K,
        node: impl NavNode<K>,
        build: impl FnOnce(&mut NodeSpec<K>),
    ) -> &mut Self {
        let mut spec = NodeSpec::new(key, kind, Box::new(node));
        build(&mut spec);
        self.children.push(spec);
        self
    }

    pub fn session(
        &mut self,
        key: K,
        node: impl NavNode<K>,
        build: impl FnOnce(&mut NodeSpec<K>),
    ) -> &mut Self {
        self.child(NodeKind::Session, key, node, build)
    }

    /// A screen with no nested screens.
    pub fn screen(&mut self, key: K, node: impl NavNode<K>) -> &mut Self {
        self.child(NodeKind::Screen, key, node, |_| {})
    }

    pub fn screen_with(
        &mut self,
        key: K,
        node: impl NavNode<K>,
        build: impl FnOnce(&mut NodeSpec<K>),
    ) -> &mut Self {
        self.child(NodeKind::Screen, key, node, build)
    }
}

/// Builder for a [`NavTree`].
///
/// ```rust
/// use waymark::node::EmptyNode;
/// use waymark::tree::TreeBuilder;
/// use waymark::node_keys;
///
/// node_keys! {
///     pub enum Key { Root, Title, TitleTop }
/// }
///
/// let tree = TreeBuilder::root(Key::Root, EmptyNode, |root| {
///     root.session(Key::Title, EmptyNode, |title| {
///         title.screen(Key::TitleTop, EmptyNode);
///     });
/// })
/// .build()
/// .unwrap();
///
/// assert!(tree.contains(&Key::TitleTop));
/// ```
pub struct TreeBuilder<K: NodeKey> {
    root: NodeSpec<K>,
}

struct Flattened<K: NodeKey> {
    cells: Vec<NodeCell<K>>,
    registry: HashMap<K, NodeId>,
    checks: Vec<ConfigCheck>,
}

impl<K: NodeKey> Flattened<K> {
    fn push(&mut self, spec: NodeSpec<K>, parent: Option<(NodeId, NodeKind, String)>) {
        let id = NodeId::new(self.cells.len());
        let NodeSpec {
            key,
            kind,
            node,
            children,
        } = spec;

        if let Some((_, parent_kind, parent_name)) = &parent {
            self.checks.push(check(parent_kind.can_contain(kind), || {
                ConfigError::IllegalHierarchy {
                    parent: parent_name.clone(),
                    parent_kind: *parent_kind,
                    child: key.name().to_string(),
                    child_kind: kind,
                }
            }));
        }
        let duplicate = self.registry.contains_key(&key);
        self.checks.push(check(!duplicate, || ConfigError::DuplicateKey {
            key: key.name().to_string(),
        }));
        if !duplicate {
            self.registry.insert(key.clone(), id);
        }

        let parent_id = parent.map(|(parent_id, _, _)| parent_id);
        if let Some(parent_id) = parent_id {
            self.cells[parent_id.index()].add_child(id);
        }
        let name = key.name().to_string();
        self.cells.push(NodeCell::new(key, kind, parent_id, node));
        for child in children {
            self.push(child, Some((id, kind, name.clone())));
        }
    }
}

impl<K: NodeKey> TreeBuilder<K> {
    pub fn root(key: K, node: impl NavNode<K>, build: impl FnOnce(&mut NodeSpec<K>)) -> Self {
        let mut root = NodeSpec::new(key, NodeKind::Root, Box::new(node));
        build(&mut root);
        Self { root }
    }

    pub fn root_spec(&mut self) -> &mut NodeSpec<K> {
        &mut self.root
    }

    /// Validate the declarations and put every node in `Standby`.
    ///
    /// All duplicate keys and containment violations are reported together.
    pub fn build(self) -> Result<NavTree<K>, BuildError> {
        let mut flat = Flattened {
            cells: Vec::new(),
            registry: HashMap::new(),
            checks: Vec::new(),
        };
        flat.push(self.root, None);
        accumulate(flat.checks)?;
        Ok(NavTree::from_cells(flat.cells, flat.registry))
    }
}
