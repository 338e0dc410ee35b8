//! Preload bookkeeping.

use crate::task::{AsyncHandle, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum PreloadState {
    #[default]
    None,
    Loading,
    Loaded,
}

/// A node kept loaded ahead of (or beyond) its use by a transition.
///
/// While a record exists the node is *retained*: transitions that close the
/// node skip its unload.
#[derive(Clone, Debug)]
pub(crate) struct PreloadRecord {
    pub state: PreloadState,
    pub handle: AsyncHandle,
    pub task: Option<TaskId>,
}

impl PreloadRecord {
    pub fn loading(handle: AsyncHandle) -> Self {
        Self {
            state: PreloadState::Loading,
            handle,
            task: None,
        }
    }

    pub fn loaded() -> Self {
        Self {
            state: PreloadState::Loaded,
            handle: AsyncHandle::completed(),
            task: None,
        }
    }
}
