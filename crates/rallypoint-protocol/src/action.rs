//! Action calls: combat operations executed identically by every receiver.
//!
//! An action never carries a resulting state ("health is now 70"); it
//! carries the inputs of a state change ("30 damage from P-1") and every
//! receiver recomputes the result from its own copy of the state. That
//! only converges if each call is applied exactly once and in the sender's
//! order, which is why calls are numbered per sender (`seq`).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ParticipantId;

/// The operation an [`ActionCall`] asks every receiver to perform.
///
/// `#[serde(tag = "type")]` keeps the JSON flat:
/// `{ "type": "Damage", "target": 2, "amount": 30, "attacker": 1 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Subtract `amount` health from `target`, credited to `attacker`.
    Damage {
        target: ParticipantId,
        amount: i32,
        attacker: ParticipantId,
    },

    /// Cosmetic: `shooter` fired, optionally hitting something at `hit_point`.
    FireEffect {
        shooter: ParticipantId,
        hit_point: Option<Vec3>,
    },

    /// A kill-feed line. Only the master participant sends these.
    Log { message: String },
}

/// A numbered action invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    /// Participant that issued the call.
    pub sender: ParticipantId,
    /// Per-sender sequence number, starting at 1 and strictly increasing.
    pub seq: u64,
    pub action: Action,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_damage_json_format() {
        let call = ActionCall {
            sender: ParticipantId(1),
            seq: 4,
            action: Action::Damage {
                target: ParticipantId(2),
                amount: 30,
                attacker: ParticipantId(1),
            },
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["seq"], 4);
        assert_eq!(json["action"]["type"], "Damage");
        assert_eq!(json["action"]["target"], 2);
        assert_eq!(json["action"]["amount"], 30);
    }

    #[test]
    fn test_action_fire_effect_without_hit() {
        let action = Action::FireEffect {
            shooter: ParticipantId(3),
            hit_point: None,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "FireEffect");
        assert!(json["hit_point"].is_null());
    }

    #[test]
    fn test_decode_unknown_action_type_returns_error() {
        let unknown = r#"{"type": "Heal", "target": 1}"#;
        let result: Result<Action, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
