//! Pure path planning over parent links.

use crate::node::NodeId;
use std::collections::HashSet;

/// Nodes to close and open for one transition.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TransitionPath {
    /// Innermost first, stopping below the common ancestor.
    pub close: Vec<NodeId>,
    /// Outermost first, starting below the common ancestor.
    pub open: Vec<NodeId>,
    /// Deepest node shared by both paths, if any.
    pub ancestor: Option<NodeId>,
}

/// `id` and all of its ancestors, innermost first.
pub fn ancestors(parent_of: impl Fn(NodeId) -> Option<NodeId>, id: NodeId) -> Vec<NodeId> {
    let mut chain = vec![id];
    let mut cursor = id;
    while let Some(parent) = parent_of(cursor) {
        chain.push(parent);
        cursor = parent;
    }
    chain
}

pub fn common_ancestor(
    parent_of: impl Fn(NodeId) -> Option<NodeId>,
    a: NodeId,
    b: NodeId,
) -> Option<NodeId> {
    let theirs: HashSet<NodeId> = ancestors(&parent_of, b).into_iter().collect();
    ancestors(&parent_of, a)
        .into_iter()
        .find(|id| theirs.contains(id))
}

/// Walk up from `start`, stopping before `stop`.
fn chain_below(
    parent_of: impl Fn(NodeId) -> Option<NodeId>,
    start: NodeId,
    stop: Option<NodeId>,
) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut cursor = Some(start);
    while let Some(id) = cursor {
        if Some(id) == stop {
            break;
        }
        chain.push(id);
        cursor = parent_of(id);
    }
    chain
}

/// Plan a transition from `from` to `to`.
///
/// Without `refresh` the shared part of both root paths stays untouched.
/// With `refresh` the whole old path closes and the whole new path opens, so
/// the two sets may overlap.
pub fn plan(
    parent_of: impl Fn(NodeId) -> Option<NodeId>,
    from: Option<NodeId>,
    to: NodeId,
    refresh: bool,
) -> TransitionPath {
    let ancestor = match from {
        Some(from) if !refresh => common_ancestor(&parent_of, from, to),
        _ => None,
    };
    let close = from
        .map(|from| chain_below(&parent_of, from, ancestor))
        .unwrap_or_default();
    let mut open = chain_below(&parent_of, to, ancestor);
    open.reverse();
    TransitionPath {
        close,
        open,
        ancestor,
    }
}
