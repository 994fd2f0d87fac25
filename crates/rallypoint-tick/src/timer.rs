//! Countdowns advanced by tick deltas.
//!
//! [`SessionTimer`] chains the two countdowns a match needs: the match
//! timer, then the exit grace timer. It reports each zero crossing exactly
//! once as a [`TimerEdge`]; what happens on that edge is up to the room
//! lifecycle.

use std::time::Duration;

use tracing::debug;

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// A countdown that only moves when [`tick`](Self::tick) is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Option<Duration>,
}

impl Countdown {
    /// A running countdown of `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            remaining: Some(duration),
        }
    }

    /// (Re)starts the countdown at `duration`.
    pub fn start(&mut self, duration: Duration) {
        self.remaining = Some(duration);
    }

    /// Advances by `dt`. Returns `true` on the single call that reaches zero.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.remaining = None;
            true
        } else {
            self.remaining = Some(remaining);
            false
        }
    }

    /// Stops the countdown without firing.
    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Time left; zero when not running.
    pub fn remaining(&self) -> Duration {
        self.remaining.unwrap_or(Duration::ZERO)
    }
}

// ---------------------------------------------------------------------------
// SessionTimer
// ---------------------------------------------------------------------------

/// Which of the session timers is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Match,
    ExitGrace,
}

/// A zero crossing reported by [`SessionTimer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEdge {
    /// The match timer ran out; the exit grace timer has started.
    MatchEnded,
    /// The exit grace timer ran out; the timer is idle again.
    ExitElapsed,
}

/// Match timer followed by exit grace timer.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    phase: TimerPhase,
    countdown: Countdown,
    exit_grace: Duration,
}

impl SessionTimer {
    pub fn new(exit_grace: Duration) -> Self {
        Self {
            phase: TimerPhase::Idle,
            countdown: Countdown::default(),
            exit_grace,
        }
    }

    /// Starts the match timer, replacing whatever was running.
    pub fn start_match(&mut self, duration: Duration) {
        debug!(secs = duration.as_secs(), "match timer started");
        self.phase = TimerPhase::Match;
        self.countdown.start(duration);
    }

    /// Advances the running timer by `dt`.
    ///
    /// At most one edge is reported per call: a match timer that expires
    /// starts the exit timer at its full length regardless of how far past
    /// zero `dt` went.
    pub fn tick(&mut self, dt: Duration) -> Option<TimerEdge> {
        if !self.countdown.tick(dt) {
            return None;
        }
        match self.phase {
            TimerPhase::Match => {
                self.phase = TimerPhase::ExitGrace;
                self.countdown.start(self.exit_grace);
                Some(TimerEdge::MatchEnded)
            }
            TimerPhase::ExitGrace => {
                self.phase = TimerPhase::Idle;
                Some(TimerEdge::ExitElapsed)
            }
            TimerPhase::Idle => None,
        }
    }

    /// Discards both timers. Nothing fires afterwards.
    pub fn cancel(&mut self) {
        if self.phase != TimerPhase::Idle {
            debug!(phase = ?self.phase, "session timers cancelled");
        }
        self.phase = TimerPhase::Idle;
        self.countdown.cancel();
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Time left on the running timer.
    pub fn remaining(&self) -> Duration {
        self.countdown.remaining()
    }

    /// The match clock as `mm:ss`, rounding partial seconds up.
    /// Shows `00:00` once the match timer has run out.
    pub fn match_clock(&self) -> String {
        let secs = match self.phase {
            TimerPhase::Match => ceil_secs(self.remaining()),
            _ => 0,
        };
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Whole seconds left on the exit grace timer, rounded up.
    pub fn exit_clock(&self) -> Option<u64> {
        (self.phase == TimerPhase::ExitGrace).then(|| ceil_secs(self.remaining()))
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn test_countdown_tick_fires_once_at_zero() {
        let mut c = Countdown::new(Duration::from_millis(100));
        assert!(!c.tick(Duration::from_millis(60)));
        assert!(c.tick(Duration::from_millis(60)));
        assert!(!c.is_running());
        assert!(!c.tick(Duration::from_millis(60)));
    }

    #[test]
    fn test_countdown_cancel_never_fires() {
        let mut c = Countdown::new(SEC);
        c.cancel();
        assert!(!c.tick(SEC * 5));
        assert_eq!(c.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_session_timer_match_then_exit_edges() {
        let mut t = SessionTimer::new(SEC * 5);
        t.start_match(SEC * 60);

        assert_eq!(t.tick(SEC * 59), None);
        assert_eq!(t.tick(SEC), Some(TimerEdge::MatchEnded));
        assert_eq!(t.phase(), TimerPhase::ExitGrace);
        assert_eq!(t.remaining(), SEC * 5);

        assert_eq!(t.tick(SEC * 4), None);
        assert_eq!(t.tick(SEC), Some(TimerEdge::ExitElapsed));
        assert_eq!(t.phase(), TimerPhase::Idle);
        assert_eq!(t.tick(SEC), None);
    }

    #[test]
    fn test_session_timer_cancel_discards_pending_edges() {
        let mut t = SessionTimer::new(SEC * 5);
        t.start_match(SEC);
        t.cancel();
        assert_eq!(t.tick(SEC * 10), None);
        assert_eq!(t.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_match_clock_rounds_partial_seconds_up() {
        let mut t = SessionTimer::new(SEC * 5);
        t.start_match(SEC * 300);
        assert_eq!(t.match_clock(), "05:00");
        t.tick(Duration::from_millis(500));
        assert_eq!(t.match_clock(), "05:00");
        t.tick(Duration::from_millis(600));
        assert_eq!(t.match_clock(), "04:59");
    }

    #[test]
    fn test_exit_clock_only_during_grace() {
        let mut t = SessionTimer::new(SEC * 5);
        t.start_match(SEC);
        assert_eq!(t.exit_clock(), None);
        t.tick(SEC);
        assert_eq!(t.exit_clock(), Some(5));
        assert_eq!(t.match_clock(), "00:00");
        t.tick(Duration::from_millis(1500));
        assert_eq!(t.exit_clock(), Some(4));
    }
}
