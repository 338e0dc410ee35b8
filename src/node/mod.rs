//! Navigation nodes: keys, kinds, phases and the node contract.

mod cell;
mod key;
mod kind;
mod lifecycle;
mod phase;
mod scope;

pub(crate) use cell::{NodeCell, PhaseRoutine, SharedCell};

pub use cell::NodeId;
pub use key::NodeKey;
pub use kind::NodeKind;
pub use lifecycle::{downcast_mut, downcast_ref, AsAny, EmptyNode, HookResult, NavNode};
pub use phase::{Phase, Teardown};
pub use scope::Scope;
