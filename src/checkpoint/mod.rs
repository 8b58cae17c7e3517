//! Snapshot and resume of a machine's position.
//!
//! A [`Snapshot`] records the current/previous/next state ids and the tick
//! and transition counters. It never contains callbacks or user data; those
//! stay with the application's state table. Resuming is done through
//! [`FsmBuilder::resume`](crate::FsmBuilder::resume).

use crate::core::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable record of a machine's state triple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// Id of the current state
    pub current: StateId,

    /// Id of the state left by the most recent transition
    pub previous: StateId,

    /// Id of the pending target; equal to `current` when nothing is pending
    pub next: StateId,

    /// Ticks executed before the snapshot
    pub ticks: u64,

    /// Transitions applied before the snapshot
    pub transitions: u64,
}

impl Snapshot {
    pub(crate) fn new(
        current: StateId,
        previous: StateId,
        next: StateId,
        ticks: u64,
        transitions: u64,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            taken_at: Utc::now(),
            current,
            previous,
            next,
            ticks,
            transitions,
        }
    }

    /// Whether a transition was pending when the snapshot was taken.
    pub fn has_pending_transition(&self) -> bool {
        self.current != self.next
    }

    /// Human-readable encoding.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Decode a JSON snapshot, rejecting unsupported versions.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    /// Compact encoding for flash or EEPROM storage.
    pub fn to_binary(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Decode a binary snapshot, rejecting unsupported versions.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshot_uses_current_version() {
        let snapshot = Snapshot::new(2, 1, 3, 10, 4);

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.has_pending_transition());
    }

    #[test]
    fn settled_snapshot_has_no_pending_transition() {
        let snapshot = Snapshot::new(2, 1, 2, 0, 0);

        assert!(!snapshot.has_pending_transition());
    }

    #[test]
    fn json_preserves_snapshot() {
        let snapshot = Snapshot::new(2, 1, 3, 10, 4);

        let json = snapshot.to_json().unwrap();
        let decoded = Snapshot::from_json(&json).unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn binary_preserves_snapshot() {
        let snapshot = Snapshot::new(7, 7, 7, 1, 0);

        let bytes = snapshot.to_binary().unwrap();
        let decoded = Snapshot::from_binary(&bytes).unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut snapshot = Snapshot::new(1, 1, 1, 0, 0);
        snapshot.version = SNAPSHOT_VERSION + 1;
        let json = serde_json::to_string(&snapshot).unwrap();

        let result = Snapshot::from_json(&json);

        assert!(matches!(
            result,
            Err(SnapshotError::UnsupportedVersion { found, supported })
                if found == SNAPSHOT_VERSION + 1 && supported == SNAPSHOT_VERSION
        ));
    }

    #[test]
    fn garbage_input_fails_to_decode() {
        assert!(matches!(
            Snapshot::from_json("not a snapshot"),
            Err(SnapshotError::DeserializationFailed(_))
        ));
        assert!(matches!(
            Snapshot::from_binary(&[1, 2, 3]),
            Err(SnapshotError::DeserializationFailed(_))
        ));
    }
}
