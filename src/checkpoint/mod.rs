//! Router checkpoints.
//!
//! A checkpoint captures a router's history so that navigation can resume
//! where it left off after a restart. Node state itself is not captured;
//! nodes reload when the restored position is entered again.

use crate::error::CheckpointError;
use crate::node::NodeKey;
use crate::router::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a router's history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RouterCheckpoint<K: NodeKey> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Router position when captured
    pub current: Option<K>,

    /// History, oldest first, current last
    pub history: Vec<K>,
}

impl<K: NodeKey> RouterCheckpoint<K> {
    pub fn capture(router: &dyn Router<K>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            current: router.current_key(),
            history: router.history(),
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::Encode {
            format: "JSON",
            message: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| CheckpointError::Decode {
                format: "JSON",
                message: e.to_string(),
            })?;
        checkpoint.validate_version()?;
        Ok(checkpoint)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode {
            format: "bincode",
            message: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            bincode::deserialize(bytes).map_err(|e| CheckpointError::Decode {
                format: "bincode",
                message: e.to_string(),
            })?;
        checkpoint.validate_version()?;
        Ok(checkpoint)
    }

    fn validate_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }

    /// Restore everything below the captured position into `router` and
    /// return the position itself.
    ///
    /// The router is left one step short so that transitioning to the
    /// returned key re-enters it with the full history in place.
    pub fn restore(&self, router: &mut dyn Router<K>) -> Result<Option<K>, CheckpointError> {
        self.validate_version()?;
        if let Some(unknown) = self.history.iter().find(|k| !router.tree().contains(k)) {
            return Err(CheckpointError::UnknownKey {
                key: unknown.name().to_string(),
            });
        }
        let Some((last, below)) = self.history.split_last() else {
            router.set_history(Vec::new());
            return Ok(None);
        };
        router.set_history(below.to_vec());
        Ok(Some(last.clone()))
    }
}
