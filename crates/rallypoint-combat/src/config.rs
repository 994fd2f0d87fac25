use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Combat tunables. Every participant must run with the same values, since
/// each one resolves every action locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    pub max_health: i32,
    pub weapon_damage: i32,
    /// Shots per second while the trigger is held.
    pub fire_rate: f32,
    /// How long a kill-feed line stays up.
    pub log_duration: Duration,
    /// Kill-feed lines shown at once before lines start lingering longer.
    pub visible_log_lines: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            weapon_damage: 10,
            fire_rate: 2.0,
            log_duration: Duration::from_secs(3),
            visible_log_lines: 4,
        }
    }
}

impl CombatConfig {
    /// Clamps out-of-range values, warning about each one.
    pub fn validated(mut self) -> Self {
        if self.max_health < 1 {
            warn!(requested = self.max_health, "max_health must be positive, using 1");
            self.max_health = 1;
        }
        if self.weapon_damage < 0 {
            warn!(requested = self.weapon_damage, "negative weapon_damage, using 0");
            self.weapon_damage = 0;
        }
        if !(self.fire_rate.is_finite() && self.fire_rate > 0.0) {
            warn!(requested = self.fire_rate, "fire_rate must be positive, using 1");
            self.fire_rate = 1.0;
        }
        if self.visible_log_lines == 0 {
            warn!("visible_log_lines must be at least 1");
            self.visible_log_lines = 1;
        }
        self
    }

    /// Time between two shots while the trigger is held.
    pub fn fire_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.fire_rate)
    }
}
