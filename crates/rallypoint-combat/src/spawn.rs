use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rallypoint_replication::Transform;

use crate::CombatError;

/// The places an avatar can (re)appear, picked uniformly at random.
#[derive(Debug, Clone)]
pub struct SpawnPool {
    points: Vec<Transform>,
    rng: StdRng,
}

impl SpawnPool {
    /// # Errors
    /// [`CombatError::EmptySpawnPool`] if `points` is empty.
    pub fn new(points: Vec<Transform>) -> Result<Self, CombatError> {
        Self::with_rng(points, StdRng::from_os_rng())
    }

    /// A pool with reproducible picks.
    pub fn seeded(points: Vec<Transform>, seed: u64) -> Result<Self, CombatError> {
        Self::with_rng(points, StdRng::seed_from_u64(seed))
    }

    fn with_rng(points: Vec<Transform>, rng: StdRng) -> Result<Self, CombatError> {
        if points.is_empty() {
            return Err(CombatError::EmptySpawnPool);
        }
        Ok(Self { points, rng })
    }

    pub fn points(&self) -> &[Transform] {
        &self.points
    }

    pub fn pick(&mut self) -> Transform {
        let i = self.rng.random_range(0..self.points.len());
        self.points[i]
    }
}
