//! Per-participant combat and score records.

use rallypoint_protocol::ParticipantId;
use serde::{Deserialize, Serialize};

/// Health of one participant's avatar.
///
/// `last_attacker` is a plain id looked up in the protocol's record table
/// when needed; the record never holds the attacker itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRecord {
    pub health: i32,
    pub last_attacker: Option<ParticipantId>,
}

impl CombatRecord {
    pub fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            last_attacker: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

/// Kills, deaths and the derived score of one participant for the
/// lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    kills: u32,
    deaths: u32,
    score: i64,
}

impl PlayerRecord {
    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// `kills − deaths`.
    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn add_kill(&mut self) {
        self.kills += 1;
        self.recompute();
    }

    pub fn add_death(&mut self) {
        self.deaths += 1;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.score = i64::from(self.kills) - i64::from(self.deaths);
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub participant: ParticipantId,
    pub nickname: String,
    pub kills: u32,
    pub deaths: u32,
    pub score: i64,
    pub is_local: bool,
}

impl LeaderboardEntry {
    /// Score with an explicit sign for positive values ("+2", "0", "-1").
    pub fn score_label(&self) -> String {
        if self.score > 0 {
            format!("+{}", self.score)
        } else {
            self.score.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_record_score_tracks_kills_minus_deaths() {
        let mut record = PlayerRecord::default();
        record.add_kill();
        record.add_death();
        record.add_death();

        assert_eq!((record.kills(), record.deaths(), record.score()), (1, 2, -1));
    }

    #[test]
    fn test_score_label_signs() {
        let mut entry = LeaderboardEntry {
            participant: ParticipantId(1),
            nickname: "Ana".into(),
            kills: 3,
            deaths: 1,
            score: 2,
            is_local: true,
        };
        assert_eq!(entry.score_label(), "+2");
        entry.score = 0;
        assert_eq!(entry.score_label(), "0");
        entry.score = -4;
        assert_eq!(entry.score_label(), "-4");
    }
}
