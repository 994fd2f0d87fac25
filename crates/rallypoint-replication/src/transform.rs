//! Transforms, smoothing and the lag-compensation offset.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::SmoothingConfig;

/// Position and orientation of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// One smoothing step of `dt` seconds toward `target`.
    ///
    /// Position axes are blended independently by
    /// `min(rate_axis * dt, 1)`; rotation is slerped by
    /// `min(rotation_rate * dt, 1)`. A factor of 1 lands on the target.
    pub fn smooth_toward(&self, target: &Transform, smoothing: &SmoothingConfig, dt: f32) -> Transform {
        let t = (smoothing.position_rate * dt).min(Vec3::ONE);
        let position = self.position + (target.position - self.position) * t;
        let r = (smoothing.rotation_rate * dt).min(1.0);
        let rotation = self.rotation.slerp(target.rotation, r);
        Transform { position, rotation }
    }
}

/// The distance to predict a replica ahead of its newest snapshot.
///
/// `latency_ms × factor × velocity`, shortened to `max_offset` if longer.
/// Direction is always that of `velocity`.
///
/// ```rust
/// use glam::Vec3;
/// use rallypoint_replication::lag_compensation;
///
/// let offset = lag_compensation(50, Vec3::new(10.0, 0.0, 0.0), 0.5, 0.2);
/// assert!(offset.abs_diff_eq(Vec3::new(0.2, 0.0, 0.0), 1e-6));
/// ```
pub fn lag_compensation(latency_ms: u64, velocity: Vec3, factor: f32, max_offset: f32) -> Vec3 {
    let latency = latency_ms as f32 / 1000.0;
    (velocity * latency * factor).clamp_length_max(max_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_compensation_under_cap_is_unchanged() {
        let offset = lag_compensation(20, Vec3::new(0.0, 0.0, 5.0), 0.5, 0.2);
        assert!(offset.abs_diff_eq(Vec3::new(0.0, 0.0, 0.05), 1e-6));
    }

    #[test]
    fn test_lag_compensation_over_cap_keeps_direction() {
        let velocity = Vec3::new(3.0, 0.0, 4.0);
        let offset = lag_compensation(1000, velocity, 1.0, 1.0);
        assert!((offset.length() - 1.0).abs() < 1e-6);
        assert!(offset.normalize().abs_diff_eq(velocity.normalize(), 1e-6));
    }

    #[test]
    fn test_lag_compensation_zero_velocity_is_zero() {
        assert_eq!(lag_compensation(500, Vec3::ZERO, 0.5, 0.2), Vec3::ZERO);
    }

    #[test]
    fn test_smooth_toward_uses_per_axis_rate() {
        let smoothing = SmoothingConfig {
            position_rate: Vec3::new(10.0, 0.0, 100.0),
            rotation_rate: 15.0,
        };
        let from = Transform::default();
        let to = Transform::from_position(Vec3::ONE);
        let next = from.smooth_toward(&to, &smoothing, 0.05);

        // x: half way, y: frozen, z: factor capped at 1.
        assert!(next.position.abs_diff_eq(Vec3::new(0.5, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_smooth_toward_converges() {
        let smoothing = SmoothingConfig::default();
        let target = Transform {
            position: Vec3::new(4.0, 0.0, -2.0),
            rotation: Quat::from_rotation_y(1.2),
        };
        let mut shown = Transform::default();
        for _ in 0..200 {
            shown = shown.smooth_toward(&target, &smoothing, 0.02);
        }
        assert!(shown.position.abs_diff_eq(target.position, 1e-3));
        assert!(shown.rotation.abs_diff_eq(target.rotation, 1e-3));
    }
}
