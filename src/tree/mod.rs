//! The navigation tree and its transition machinery.

mod builder;
mod nav_tree;
pub mod path;
mod preload;
mod record;
mod resolver;
mod state;

pub use builder::{NodeSpec, TreeBuilder};
pub use nav_tree::NavTree;
pub use path::TransitionPath;
pub use preload::PreloadState;
pub use record::TransitionState;

pub(crate) use preload::PreloadRecord;
pub(crate) use record::TransitionRecord;
pub(crate) use resolver::TreeResolver;
pub(crate) use state::TreeState;
