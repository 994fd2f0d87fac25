use rallypoint_combat::CombatConfig;
use rallypoint_replication::ReplicationConfig;
use rallypoint_room::LifecycleConfig;
use rallypoint_tick::TickConfig;
use serde::{Deserialize, Serialize};

/// Every tunable of a session.
///
/// Missing sections fall back to their defaults when deserialized, so a
/// config file only needs to mention what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub tick: TickConfig,
    pub lifecycle: LifecycleConfig,
    pub replication: ReplicationConfig,
    pub combat: CombatConfig,
}

impl ClientConfig {
    /// Clamps every section's out-of-range values.
    pub fn validated(self) -> Self {
        Self {
            tick: self.tick.validated(),
            lifecycle: self.lifecycle.validated(),
            replication: self.replication.validated(),
            combat: self.combat.validated(),
        }
    }
}
