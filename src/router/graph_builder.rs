//! Builder for [`TreeRouter`].

use super::graph::{Fallback, RouteGraph, RouteNode};
use super::TreeRouter;
use crate::error::{accumulate, check, BuildError, ConfigCheck, ConfigError};
use crate::node::NodeKey;
use crate::tree::NavTree;

/// A route declaration and its outgoing edges.
pub struct RouteSpec<K: NodeKey> {
    key: K,
    children: Vec<RouteSpec<K>>,
    fallbacks: Vec<Option<K>>,
}

impl<K: NodeKey> RouteSpec<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            children: Vec::new(),
            fallbacks: Vec::new(),
        }
    }

    /// Declare an edge to `key` and describe its own edges.
    pub fn connect(&mut self, key: K, build: impl FnOnce(&mut RouteSpec<K>)) -> &mut Self {
        let mut child = RouteSpec::new(key);
        build(&mut child);
        self.children.push(child);
        self
    }

    /// Declare an edge to `key` with no further edges.
    pub fn leaf(&mut self, key: K) -> &mut Self {
        self.connect(key, |_| {})
    }

    /// Make this route reachable from anywhere.
    pub fn fallback(&mut self) -> &mut Self {
        self.fallbacks.push(None);
        self
    }

    /// Make this route reachable from anywhere below `scope`, which must be
    /// this route or one of its ancestors.
    pub fn fallback_within(&mut self, scope: K) -> &mut Self {
        self.fallbacks.push(Some(scope));
        self
    }
}

/// Declares the route graph of a [`TreeRouter`].
///
/// ```rust
/// use waymark::node::EmptyNode;
/// use waymark::router::{Router, TreeRouterBuilder};
/// use waymark::tree::TreeBuilder;
///
/// let key = |s: &str| s.to_string();
/// let tree = TreeBuilder::root(key("Root"), EmptyNode, |root| {
///     root.session(key("Out"), EmptyNode, |out| {
///         out.screen(key("Home"), EmptyNode);
///         out.screen(key("Shop"), EmptyNode);
///     });
/// })
/// .build()
/// .unwrap();
///
/// let router = TreeRouterBuilder::new()
///     .add_root(key("Home"), |home| {
///         home.connect(key("Shop"), |shop| {
///             shop.fallback();
///         });
///     })
///     .build(tree)
///     .unwrap();
///
/// assert_eq!(router.keys(), vec![key("Home"), key("Shop")]);
/// ```
pub struct TreeRouterBuilder<K: NodeKey> {
    roots: Vec<RouteSpec<K>>,
}

impl<K: NodeKey> Default for TreeRouterBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

struct Assembly<'a, K: NodeKey> {
    tree: &'a NavTree<K>,
    graph: RouteGraph<K>,
    checks: Vec<ConfigCheck>,
}

impl<K: NodeKey> Assembly<'_, K> {
    fn add(&mut self, spec: RouteSpec<K>, parent: Option<usize>) {
        let RouteSpec {
            key,
            children,
            fallbacks,
        } = spec;
        let index = self.graph.nodes.len();
        self.checks.push(check(self.tree.contains(&key), || {
            ConfigError::UnknownRouterKey {
                key: key.name().to_string(),
            }
        }));
        match parent {
            Some(parent) => self.graph.nodes[parent].children.push(index),
            None => self.graph.roots.push(index),
        }
        self.graph.nodes.push(RouteNode {
            key: key.clone(),
            parent,
            children: Vec::new(),
        });

        for scope in fallbacks {
            self.add_fallback(index, &key, scope);
        }
        for child in children {
            self.add(child, Some(index));
        }
    }

    fn add_fallback(&mut self, target: usize, key: &K, scope: Option<K>) {
        let resolved = match &scope {
            None => Some(None),
            Some(scope_key) => self.find_in_lineage(target, scope_key).map(Some),
        };
        let scope_name = scope
            .as_ref()
            .map_or_else(|| "global".to_string(), |k| k.name().to_string());
        let Some(resolved) = resolved else {
            self.checks.push(check(false, || ConfigError::UnknownFallbackScope {
                key: key.name().to_string(),
                scope: scope_name,
            }));
            return;
        };
        let duplicate = self
            .graph
            .fallbacks
            .iter()
            .any(|f| f.scope == resolved && self.graph.nodes[f.target].key == *key);
        self.checks.push(check(!duplicate, || ConfigError::DuplicateFallback {
            key: key.name().to_string(),
            scope: scope_name,
        }));
        if !duplicate {
            self.graph.fallbacks.push(Fallback {
                target,
                scope: resolved,
            });
        }
    }

    fn find_in_lineage(&self, index: usize, key: &K) -> Option<usize> {
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            if self.graph.nodes[i].key == *key {
                return Some(i);
            }
            cursor = self.graph.nodes[i].parent;
        }
        None
    }
}

impl<K: NodeKey> TreeRouterBuilder<K> {
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    pub fn add_root(mut self, key: K, build: impl FnOnce(&mut RouteSpec<K>)) -> Self {
        let mut root = RouteSpec::new(key);
        build(&mut root);
        self.roots.push(root);
        self
    }

    /// Validate the graph against `tree`. Every problem is reported.
    pub fn build(self, tree: NavTree<K>) -> Result<TreeRouter<K>, BuildError> {
        let mut assembly = Assembly {
            tree: &tree,
            graph: RouteGraph {
                nodes: Vec::new(),
                roots: Vec::new(),
                fallbacks: Vec::new(),
            },
            checks: Vec::new(),
        };
        for root in self.roots {
            assembly.add(root, None);
        }
        let Assembly { graph, checks, .. } = assembly;
        accumulate(checks)?;
        Ok(TreeRouter::new(tree, graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::EmptyNode;
    use crate::router::Router;
    use crate::tree::TreeBuilder;

    fn key(name: &str) -> String {
        name.to_string()
    }

    fn tree() -> NavTree<String> {
        TreeBuilder::root(key("Root"), EmptyNode, |root| {
            root.session(key("Out"), EmptyNode, |out| {
                out.screen(key("Home"), EmptyNode);
                out.screen(key("Shop"), EmptyNode);
                out.screen(key("Party"), EmptyNode);
            });
        })
        .build()
        .unwrap()
    }

    #[test]
    fn unknown_keys_and_scopes_are_reported_together() {
        let result = TreeRouterBuilder::new()
            .add_root(key("Home"), |home| {
                home.connect(key("Nowhere"), |_| {});
                home.connect(key("Shop"), |shop| {
                    shop.fallback_within(key("Party"));
                });
            })
            .build(tree());

        let errors = result.err().map(|e| e.errors).unwrap_or_default();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownRouterKey { key } if key == "Nowhere")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownFallbackScope { scope, .. } if scope == "Party")));
    }

    #[test]
    fn duplicate_fallback_is_rejected() {
        let result = TreeRouterBuilder::new()
            .add_root(key("Home"), |home| {
                home.connect(key("Shop"), |shop| {
                    shop.fallback().fallback();
                });
            })
            .build(tree());

        let errors = result.err().map(|e| e.errors).unwrap_or_default();
        assert_eq!(
            errors,
            vec![ConfigError::DuplicateFallback {
                key: key("Shop"),
                scope: key("global"),
            }]
        );
    }

    #[test]
    fn scoped_fallback_may_name_an_ancestor() {
        let router = TreeRouterBuilder::new()
            .add_root(key("Home"), |home| {
                home.connect(key("Shop"), |shop| {
                    shop.connect(key("Party"), |party| {
                        party.fallback_within(key("Shop"));
                    });
                });
            })
            .build(tree())
            .unwrap();

        assert_eq!(router.keys(), vec![key("Home"), key("Shop"), key("Party")]);
    }
}
