//! Waymark: hierarchical navigation with cooperative, tick-driven transitions
//!
//! An application's screens are arranged as a tree of [`NavNode`]s: a root,
//! sessions grouping related screens, and the screens themselves. Moving
//! from one screen to another closes the part of the old path that is not
//! shared with the new one and opens the rest, running each node's lifecycle
//! hooks as cooperative routines advanced once per [`update`](NavTree::update).
//!
//! # Core Concepts
//!
//! - **Tasks**: [`Routine`]s suspended by yielding, run by a [`Scheduler`]
//! - **Nodes**: lifecycle hooks with a guarded [`Phase`] progression
//! - **Transitions**: strategies ordering close, unload, load and open steps
//! - **Tree**: the node hierarchy and the single in-flight transition
//! - **Routers**: stack or graph history layered over the tree
//!
//! # Example
//!
//! ```rust
//! use waymark::prelude::*;
//! use waymark::node_keys;
//!
//! node_keys! {
//!     enum Key { Root, Menu, Title, Home }
//! }
//!
//! let mut engine = NavigationEngine::builder()
//!     .tree(TreeBuilder::root(Key::Root, EmptyNode, |root| {
//!         root.session(Key::Menu, EmptyNode, |menu| {
//!             menu.screen(Key::Title, EmptyNode);
//!             menu.screen(Key::Home, EmptyNode);
//!         });
//!     }))
//!     .stack_router()
//!     .build()
//!     .unwrap();
//!
//! let handle = engine.transition_to(&Key::Title, TransitionRequest::new()).unwrap();
//! while handle.is_transitioning() {
//!     engine.update();
//! }
//! assert_eq!(engine.current_key(), Some(Key::Title));
//! ```

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
mod macros;
pub mod node;
pub mod router;
pub mod task;
pub mod transition;
pub mod tree;

// Re-export commonly used types
pub use config::EngineOptions;
pub use engine::{NavigationEngine, NavigationEngineBuilder};
pub use error::{
    BuildError, CheckpointError, ConfigError, LifecycleError, NodeFault, RequestError, TaskError,
};
pub use node::{NavNode, NodeKey, NodeKind, Phase, Scope};
pub use router::{Router, StackRouter, TreeRouter, TreeRouterBuilder};
pub use task::{Routine, Scheduler, Task, Yield};
pub use transition::{TransitionContext, TransitionHandle, TransitionRequest};
pub use tree::{NavTree, TreeBuilder};

/// Everything needed to declare nodes and drive an engine.
pub mod prelude {
    pub use crate::config::EngineOptions;
    pub use crate::engine::{NavigationEngine, NavigationEngineBuilder};
    pub use crate::error::{NodeFault, RequestError, TaskError};
    pub use crate::node::{EmptyNode, HookResult, NavNode, NodeKey, NodeKind, Phase, Scope};
    pub use crate::router::{RouteSpec, Router, StackRouter, TreeRouter, TreeRouterBuilder};
    pub use crate::task::{routine, BoxRoutine, Routine, Yield};
    pub use crate::transition::{
        Cross, Direction, Sequential, TransitionContext, TransitionHandle, TransitionKind,
        TransitionRequest,
    };
    pub use crate::tree::{NavTree, NodeSpec, TreeBuilder};
}
