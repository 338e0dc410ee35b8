//! Error taxonomy for the navigation engine.
//!
//! Errors fall into four families:
//!
//! - [`ConfigError`]: static wiring mistakes found while building the tree or
//!   a router. Several of them are reported together as a [`BuildError`].
//! - [`RequestError`]: a transition request rejected at the call boundary,
//!   before any node lifecycle hook runs.
//! - [`TaskError`]: a failure raised while a cooperative task is advancing,
//!   including faults raised by node hooks.
//! - [`LifecycleError`]: a phase method called out of order.
//!
//! [`CheckpointError`] covers saving and resuming router checkpoints.

use crate::node::{NodeKind, Phase};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Static configuration mistakes detected while building.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("node '{key}' is already registered")]
    DuplicateKey { key: String },

    #[error("{parent_kind} node '{parent}' cannot contain {child_kind} node '{child}'")]
    IllegalHierarchy {
        parent: String,
        parent_kind: NodeKind,
        child: String,
        child_kind: NodeKind,
    },

    #[error("router key '{key}' is not registered in the navigation tree")]
    UnknownRouterKey { key: String },

    #[error("fallback scope '{scope}' declared on '{key}' is neither the node nor one of its ancestors")]
    UnknownFallbackScope { key: String, scope: String },

    #[error("fallback to '{key}' is declared twice in scope '{scope}'")]
    DuplicateFallback { key: String, scope: String },

    #[error("navigation tree not specified. Call .tree(builder) before .build()")]
    MissingTree,

    #[error("invalid engine options: {0}")]
    InvalidOptions(String),
}

/// One or more configuration errors, reported together.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid navigation configuration: {}", join(.errors))]
pub struct BuildError {
    pub errors: Vec<ConfigError>,
}

impl BuildError {
    pub fn new(errors: Vec<ConfigError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }
}

impl From<ConfigError> for BuildError {
    fn from(error: ConfigError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// One configuration check, accumulated with its siblings.
pub(crate) type ConfigCheck = Validation<(), NonEmptyVec<ConfigError>>;

pub(crate) fn check(passed: bool, error: impl FnOnce() -> ConfigError) -> ConfigCheck {
    if passed {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// Collect every failed check instead of stopping at the first.
pub(crate) fn accumulate(checks: Vec<ConfigCheck>) -> Result<(), BuildError> {
    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Success(()) => Ok(()),
        Validation::Failure(errors) => Err(BuildError::new(errors.iter().cloned().collect())),
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A transition request rejected before anything ran.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("a transition is already in progress")]
    AlreadyTransitioning,

    #[error("key '{key}' is not registered")]
    UnknownKey { key: String },

    #[error("no route from '{from}' to '{to}'")]
    NoRoute { from: String, to: String },

    #[error("no router is configured")]
    RouterMissing,

    #[error("the navigation tree has been shut down")]
    ShutDown,
}

/// A router checkpoint could not be written, read or resumed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("could not encode router checkpoint as {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("could not decode router checkpoint from {format}: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("router checkpoint format {found} is not readable; expected {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The history names a node the router's tree does not have.
    #[error("router checkpoint names '{key}', which is not in the tree")]
    UnknownKey { key: String },

    #[error("router refused to resume from checkpoint: {0}")]
    Rejected(#[from] RequestError),
}

/// A phase method was called while the node was in the wrong phase.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("node '{key}' cannot {operation} while {phase:?}")]
    InvalidPhaseTransition {
        key: String,
        operation: &'static str,
        phase: Phase,
    },
}

/// Error raised by a node hook or a user routine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct NodeFault {
    message: String,
}

impl NodeFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for NodeFault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for NodeFault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Failure of a cooperative task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// A node hook failed; carries the node and the operation it was in.
    #[error("node '{key}' failed during {operation}: {fault}")]
    Phase {
        key: String,
        operation: &'static str,
        fault: NodeFault,
    },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Fault(#[from] NodeFault),

    /// A routine yielded a value the task does not know how to wait on.
    #[error("unsupported yield kind '{kind}'")]
    UnsupportedYieldKind { kind: &'static str },
}

impl TaskError {
    /// Contract violations signal a bug in a routine rather than a runtime
    /// condition; fan-out routines stop polling siblings when they see one.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnsupportedYieldKind { .. })
    }

    /// Attach node context to a bare fault.
    pub(crate) fn in_phase(self, key: &str, operation: &'static str) -> Self {
        match self {
            Self::Fault(fault) => Self::Phase {
                key: key.to_string(),
                operation,
                fault,
            },
            other => other,
        }
    }
}
