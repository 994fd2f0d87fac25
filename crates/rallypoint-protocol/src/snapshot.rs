//! Transform snapshots published by an entity's owner.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{EntityId, ParticipantId};

/// A timestamped transform + velocity sample of one entity.
///
/// Only the entity's owner produces these. They travel on the unreliable
/// channel, so receivers must tolerate loss, duplication and reordering:
/// a snapshot whose `timestamp_ms` is not newer than the last one applied
/// is simply ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The entity this sample describes.
    pub entity: EntityId,
    /// The participant that produced it (must be the entity's owner).
    pub owner: ParticipantId,
    /// Synchronized network time at which the owner sampled the entity.
    pub timestamp_ms: u64,
    /// Relocation counter. A change means the owner teleported the entity
    /// (respawn) and replicas must snap rather than smooth.
    pub epoch: u32,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_vectors_serialize_as_arrays() {
        let snapshot = Snapshot {
            entity: EntityId(1),
            owner: ParticipantId(1),
            timestamp_ms: 100,
            epoch: 0,
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            velocity: Vec3::X,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["position"], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(json["rotation"], serde_json::json!([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(json["entity"], 1);
    }
}
