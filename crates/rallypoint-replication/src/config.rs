//! Replication tunables.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How fast replicas ease toward their target, in 1/s.
///
/// Each tick moves the displayed value `min(rate * dt, 1)` of the way to
/// the target; position uses a separate rate per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub position_rate: Vec3,
    pub rotation_rate: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            position_rate: Vec3::splat(15.0),
            rotation_rate: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Maximum snapshots per second per owned entity.
    pub send_rate_hz: u32,
    pub smoothing: SmoothingConfig,
    /// Fraction of the one-way latency to predict ahead along the velocity.
    pub compensation_factor: f32,
    /// Upper bound on the length of the prediction offset.
    pub max_offset: f32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            send_rate_hz: 20,
            smoothing: SmoothingConfig::default(),
            compensation_factor: 0.5,
            max_offset: 0.2,
        }
    }
}

impl ReplicationConfig {
    pub const MAX_SEND_RATE_HZ: u32 = 60;

    /// Clamps out-of-range values, warning about each one.
    pub fn validated(mut self) -> Self {
        let rate = self.send_rate_hz.clamp(1, Self::MAX_SEND_RATE_HZ);
        if rate != self.send_rate_hz {
            warn!(requested = self.send_rate_hz, clamped = rate, "send_rate_hz out of range");
            self.send_rate_hz = rate;
        }
        let position_rate = self.smoothing.position_rate.max(Vec3::ZERO);
        if position_rate != self.smoothing.position_rate {
            warn!("negative position smoothing rate, using 0");
            self.smoothing.position_rate = position_rate;
        }
        if self.smoothing.rotation_rate < 0.0 {
            warn!("negative rotation smoothing rate, using 0");
            self.smoothing.rotation_rate = 0.0;
        }
        if self.compensation_factor < 0.0 {
            warn!("negative compensation_factor, using 0");
            self.compensation_factor = 0.0;
        }
        if self.max_offset < 0.0 {
            warn!("negative max_offset, using 0");
            self.max_offset = 0.0;
        }
        self
    }

    /// Minimum time between two snapshots of the same entity.
    pub fn send_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.send_rate_hz.max(1)))
    }
}
