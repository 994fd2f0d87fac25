use std::time::Duration;

/// Fire-rate gate for a held trigger.
///
/// Pressing fires at once; holding fires again every interval; releasing
/// resets the gate so the next press fires immediately.
#[derive(Debug, Clone)]
pub struct Weapon {
    interval: Duration,
    cooldown: Duration,
}

impl Weapon {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cooldown: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advances the gate by one tick. Returns `true` if a shot goes off.
    pub fn trigger(&mut self, held: bool, dt: Duration) -> bool {
        if !held {
            self.cooldown = Duration::ZERO;
            return false;
        }
        let fired = self.cooldown.is_zero();
        if fired {
            self.cooldown = self.interval;
        }
        self.cooldown = self.cooldown.saturating_sub(dt);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn test_trigger_held_fires_at_rate() {
        let mut weapon = Weapon::new(Duration::from_millis(500));
        let shots: Vec<usize> = (0..60).filter(|_| weapon.trigger(true, TICK)).collect();
        // 1.2 s at 2 shots/s: t = 0, 0.5, 1.0.
        assert_eq!(shots, vec![0, 25, 50]);
    }

    #[test]
    fn test_trigger_release_resets_gate() {
        let mut weapon = Weapon::new(Duration::from_millis(500));
        assert!(weapon.trigger(true, TICK));
        assert!(!weapon.trigger(true, TICK));
        assert!(!weapon.trigger(false, TICK));
        assert!(weapon.trigger(true, TICK));
    }
}
