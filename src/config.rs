//! Engine options.
//!
//! Options are plain serde data so they can live in a JSON settings file
//! next to the rest of an application's configuration. Every field has a
//! default; an empty object is a valid configuration.

use crate::error::ConfigError;
use crate::router::DEFAULT_JOURNAL_CAPACITY;
use crate::transition::{for_kind, TransitionKind, TransitionRef};
use serde::{Deserialize, Serialize};

/// Defaults applied to requests that do not choose for themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Strategy used when a request carries none.
    pub default_transition: TransitionKind,

    /// Skip open and close animations by default.
    pub immediate: bool,

    /// How many completed transitions the journal keeps.
    pub journal_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_transition: TransitionKind::Sequential,
            immediate: false,
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
        }
    }
}

impl EngineOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidOptions(e.to_string()))
    }

    /// `Custom` names a strategy the engine cannot build on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_transition == TransitionKind::Custom {
            return Err(ConfigError::InvalidOptions(
                "default_transition must be 'sequential' or 'cross'".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_default_transition(mut self, kind: TransitionKind) -> Self {
        self.default_transition = kind;
        self
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity;
        self
    }

    pub(crate) fn default_transition_ref(&self) -> TransitionRef {
        for_kind(self.default_transition, self.immediate)
    }
}
