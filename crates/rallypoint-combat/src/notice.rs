use glam::Vec3;
use rallypoint_protocol::ParticipantId;
use rallypoint_replication::Transform;

/// Something combat resolution did, for presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatNotice {
    /// Cosmetic: show a muzzle flash, and a hit marker if `hit_point` is set.
    FireEffect {
        shooter: ParticipantId,
        hit_point: Option<Vec3>,
    },
    Damaged {
        target: ParticipantId,
        attacker: ParticipantId,
        health: i32,
    },
    Died {
        victim: ParticipantId,
        killer: Option<ParticipantId>,
    },
    /// Our own avatar was moved to a spawn point.
    Respawned { participant: ParticipantId, at: Transform },
    /// A kill-feed line arrived.
    Logged { message: String },
}
