//! Context handed to node hooks during a transition.

use crate::node::NodeKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which way a transition moves through navigation history.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Back,
}

/// Context provided to node hooks
#[derive(Clone, Debug)]
pub struct TransitionContext<K: NodeKey> {
    pub from: Option<K>,
    pub to: Option<K>,
    pub direction: Direction,
    /// Set when the hook runs on behalf of a preload rather than a transition.
    pub preload: bool,
    pub started_at: DateTime<Utc>,
}

impl<K: NodeKey> TransitionContext<K> {
    pub fn new(from: Option<K>, to: Option<K>, direction: Direction) -> Self {
        Self {
            from,
            to,
            direction,
            preload: false,
            started_at: Utc::now(),
        }
    }

    pub(crate) fn preload(key: K) -> Self {
        Self {
            preload: true,
            ..Self::new(None, Some(key), Direction::Forward)
        }
    }

    /// Context for hooks run outside any transition, such as shutdown.
    pub fn detached() -> Self {
        Self::new(None, None, Direction::Forward)
    }

    pub fn is_back(&self) -> bool {
        self.direction == Direction::Back
    }

    /// Calculate elapsed time since transition started (pure)
    pub fn elapsed(&self) -> Duration {
        let now = Utc::now();
        now.signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
