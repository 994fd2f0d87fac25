//! Lifecycle configuration and the client phase state machine.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// LifecycleConfig
// ---------------------------------------------------------------------------

/// Tunables of the room lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Number of countdown steps shown before a match ("3, 2, 1").
    pub countdown_steps: u8,
    /// Length of one countdown step.
    pub countdown_step: Duration,
    /// Minimum time between two local ready toggles.
    pub ready_toggle_debounce: Duration,
    /// Participant limit for rooms we create.
    pub max_participants: usize,
    /// Match length in minutes published by the master as `GameTime`.
    pub match_minutes: u32,
    /// Time between game over and the automatic leave.
    pub exit_grace: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            countdown_steps: 3,
            countdown_step: Duration::from_secs(1),
            ready_toggle_debounce: Duration::from_secs(1),
            max_participants: 4,
            match_minutes: 5,
            exit_grace: Duration::from_secs(5),
        }
    }
}

impl LifecycleConfig {
    pub const MIN_PARTICIPANTS: usize = 2;
    pub const MAX_PARTICIPANTS: usize = 16;
    pub const MIN_MATCH_MINUTES: u32 = 1;
    pub const MAX_MATCH_MINUTES: u32 = 15;

    /// Clamps out-of-range values, warning about each one.
    pub fn validated(mut self) -> Self {
        if self.countdown_steps == 0 {
            warn!("countdown_steps is 0, using 1");
            self.countdown_steps = 1;
        }
        let max = self
            .max_participants
            .clamp(Self::MIN_PARTICIPANTS, Self::MAX_PARTICIPANTS);
        if max != self.max_participants {
            warn!(
                requested = self.max_participants,
                clamped = max,
                "max_participants out of range, clamping"
            );
            self.max_participants = max;
        }
        let minutes = Self::clamp_match_minutes(i64::from(self.match_minutes));
        if minutes != self.match_minutes {
            warn!(
                requested = self.match_minutes,
                clamped = minutes,
                "match_minutes out of range, clamping"
            );
            self.match_minutes = minutes;
        }
        self
    }

    /// Clamps a `GameTime` value read from the room to the allowed range.
    pub fn clamp_match_minutes(minutes: i64) -> u32 {
        let clamped = minutes.clamp(
            i64::from(Self::MIN_MATCH_MINUTES),
            i64::from(Self::MAX_MATCH_MINUTES),
        );
        u32::try_from(clamped).unwrap_or(Self::MIN_MATCH_MINUTES)
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Where the local participant is in the session lifecycle.
///
/// ```text
/// Disconnected → Connecting → InLobby → JoiningRoom → InRoom(..)
///       ↑                        ↑                        │
///       │                        └──── (left room) ───────┤
///   (disconnect,                                          ▼
///    any phase)          Exiting ← GameOver ← InMatch ← InRoom(Starting)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    Disconnected,
    /// Connection or lobby entry in flight.
    Connecting,
    InLobby,
    /// A create or join request is in flight.
    JoiningRoom,
    /// In a room, before the match.
    InRoom(RoomPhase),
    InMatch,
    GameOver,
    /// A leave request is in flight.
    Exiting,
}

/// Sub-phase while waiting in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    WaitingForReady,
    /// Ready consensus was just reached; the countdown starts next tick.
    CountdownPending,
    /// Countdown running with this many steps left.
    Countdown(u8),
    /// Countdown finished; the match starts if consensus still holds.
    Starting,
}

impl ClientPhase {
    /// `true` while we are a member of a room (match phases included).
    pub fn is_in_room(self) -> bool {
        matches!(self, Self::InRoom(_) | Self::InMatch | Self::GameOver)
    }

    /// `true` while combat actions may be issued.
    pub fn is_match_active(self) -> bool {
        self == Self::InMatch
    }

    /// `true` while avatars exist and replicate.
    pub fn is_replicating(self) -> bool {
        matches!(self, Self::InMatch | Self::GameOver)
    }
}

impl fmt::Display for ClientPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InRoom(RoomPhase::Countdown(n)) => write!(f, "InRoom(Countdown {n})"),
            Self::InRoom(phase) => write!(f, "InRoom({phase:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_clamps_participants_and_minutes() {
        let config = LifecycleConfig {
            max_participants: 1,
            match_minutes: 60,
            countdown_steps: 0,
            ..LifecycleConfig::default()
        }
        .validated();
        assert_eq!(config.max_participants, 2);
        assert_eq!(config.match_minutes, 15);
        assert_eq!(config.countdown_steps, 1);
    }

    #[test]
    fn test_clamp_match_minutes_bounds() {
        assert_eq!(LifecycleConfig::clamp_match_minutes(0), 1);
        assert_eq!(LifecycleConfig::clamp_match_minutes(-4), 1);
        assert_eq!(LifecycleConfig::clamp_match_minutes(7), 7);
        assert_eq!(LifecycleConfig::clamp_match_minutes(99), 15);
    }

    #[test]
    fn test_phase_predicates() {
        assert!(ClientPhase::InRoom(RoomPhase::Starting).is_in_room());
        assert!(!ClientPhase::Exiting.is_in_room());
        assert!(ClientPhase::InMatch.is_match_active());
        assert!(!ClientPhase::GameOver.is_match_active());
        assert!(ClientPhase::GameOver.is_replicating());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(
            ClientPhase::InRoom(RoomPhase::Countdown(2)).to_string(),
            "InRoom(Countdown 2)"
        );
        assert_eq!(ClientPhase::InMatch.to_string(), "InMatch");
    }
}
