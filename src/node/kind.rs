//! Node kinds and the containment table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The structural role of a node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    /// The single top of the tree; owns sessions.
    Root,
    /// A long-lived grouping of screens.
    Session,
    /// A visible unit; may nest further screens.
    Screen,
}

// Rows are parents, columns are children, both in declaration order.
const CONTAINMENT: [[bool; 3]; 3] = [
    // Root   Session Screen
    [false, true, false],  // Root
    [false, false, true],  // Session
    [false, false, true],  // Screen
];

impl NodeKind {
    /// Whether a node of this kind may hold a child of `child` kind.
    pub const fn can_contain(self, child: NodeKind) -> bool {
        CONTAINMENT[self as usize][child as usize]
    }

    /// Roots and sessions are never loaded alongside siblings.
    pub const fn loads_alone(self) -> bool {
        !matches!(self, Self::Screen)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Session => "session",
            Self::Screen => "screen",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_follows_hierarchy() {
        assert!(NodeKind::Root.can_contain(NodeKind::Session));
        assert!(NodeKind::Session.can_contain(NodeKind::Screen));
        assert!(NodeKind::Screen.can_contain(NodeKind::Screen));
    }

    #[test]
    fn containment_rejects_everything_else() {
        assert!(!NodeKind::Root.can_contain(NodeKind::Root));
        assert!(!NodeKind::Root.can_contain(NodeKind::Screen));
        assert!(!NodeKind::Session.can_contain(NodeKind::Root));
        assert!(!NodeKind::Session.can_contain(NodeKind::Session));
        assert!(!NodeKind::Screen.can_contain(NodeKind::Root));
        assert!(!NodeKind::Screen.can_contain(NodeKind::Session));
    }

    #[test]
    fn only_screens_load_in_parallel_groups() {
        assert!(NodeKind::Root.loads_alone());
        assert!(NodeKind::Session.loads_alone());
        assert!(!NodeKind::Screen.loads_alone());
    }
}
