//! Core protocol types shared by every Rallypoint layer.
//!
//! These are the values the transport reports about participants and rooms
//! and the addressing used when sending. Everything here is plain data:
//! `Serialize`/`Deserialize` so it can cross the wire, `Clone` so it can be
//! queued and replayed into several components.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A participant's identity within a room.
///
/// Assigned by the transport when the participant joins and never reused
/// while the room exists. Newtype over `u32` so it can't be confused with
/// an [`EntityId`], and `#[serde(transparent)]` so it is a plain number on
/// the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifies a replicated entity.
///
/// Every participant owns exactly one avatar entity whose id is derived
/// from the owner's id, so all peers agree on it without a spawn message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The avatar entity owned by `participant`.
    pub fn avatar_of(participant: ParticipantId) -> Self {
        Self(u64::from(participant.0))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Target / Channel
// ---------------------------------------------------------------------------

/// Who receives an action invocation.
///
/// `All` includes the sender: an invocation sent to `All` is executed
/// locally through the same path as on every peer, which is what keeps
/// combat state identical everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Every participant in the room, sender included.
    All,
    /// Every participant except the sender.
    Others,
    /// One specific participant.
    Participant(ParticipantId),
}

/// Delivery guarantee of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// No loss, delivered in the sender's send order. Used for actions.
    #[default]
    ReliableOrdered,
    /// May be lost, duplicated or reordered. Used for snapshots; newer
    /// snapshots supersede older ones by timestamp.
    Unreliable,
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Custom-property key holding a participant's readiness flag.
pub const READY_KEY: &str = "IsReady";

/// Room custom-property key holding the match length in minutes.
pub const GAME_TIME_KEY: &str = "GameTime";

/// A custom property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl PropertyValue {
    /// Returns the boolean, or `None` if this isn't a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, or `None` if this isn't an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A set of custom properties. Ordered so that logs and encodings are stable.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Whose properties a `set_properties` call or update event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyScope {
    /// A participant's session properties.
    Session(ParticipantId),
    /// The current room's properties.
    Room,
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Options used when the transport has to create a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOptions {
    /// Maximum participants allowed in the room.
    pub max_participants: usize,
    /// Initial room properties.
    #[serde(default)]
    pub properties: Properties,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            max_participants: 4,
            properties: Properties::new(),
        }
    }
}

/// One entry of a lobby room-list update.
///
/// Updates are deltas: an entry with `removed == true` withdraws the room,
/// any other entry inserts or replaces the room with the same `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room name; unique within the lobby.
    pub name: String,
    /// Participants currently in the room.
    pub participant_count: usize,
    /// Maximum participants allowed.
    pub max_participants: usize,
    /// Whether the room still accepts joins.
    pub is_open: bool,
    /// Whether this entry withdraws the room from the list.
    #[serde(default)]
    pub removed: bool,
}

impl RoomSummary {
    /// `true` if a join attempt could succeed right now.
    pub fn is_joinable(&self) -> bool {
        self.is_open && self.participant_count < self.max_participants
    }

    /// The "count / max" ratio shown next to the room name.
    pub fn player_ratio(&self) -> String {
        format!("{} / {}", self.participant_count, self.max_participants)
    }
}

/// Why a join or create request was refused.
///
/// A refusal never changes room or session state; the caller just gets
/// the reason back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinFailure {
    /// The room is at its participant limit.
    Full,
    /// The room no longer accepts joins (its match has started).
    Closed,
    /// A room with this name already exists.
    NameCollision,
    /// The room doesn't exist (anymore).
    NotFound,
}

impl JoinFailure {
    /// Numeric reason code reported to the presentation layer.
    pub fn code(self) -> u16 {
        match self {
            Self::Full => 32765,
            Self::Closed => 32764,
            Self::NameCollision => 32766,
            Self::NotFound => 32758,
        }
    }
}

impl fmt::Display for JoinFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "room is full"),
            Self::Closed => write!(f, "room is closed"),
            Self::NameCollision => write!(f, "room name already taken"),
            Self::NotFound => write!(f, "room not found"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ParticipantId(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_participant_id_display() {
        assert_eq!(ParticipantId(7).to_string(), "P-7");
    }

    #[test]
    fn test_entity_id_avatar_of_uses_participant_number() {
        assert_eq!(EntityId::avatar_of(ParticipantId(12)), EntityId(12));
        assert_eq!(EntityId(12).to_string(), "E-12");
    }

    #[test]
    fn test_channel_default_is_reliable_ordered() {
        assert_eq!(Channel::default(), Channel::ReliableOrdered);
        let json = serde_json::to_string(&Channel::Unreliable).unwrap();
        assert_eq!(json, "\"Unreliable\"");
    }

    #[test]
    fn test_property_value_untagged_json() {
        // Property maps are shown to humans in logs; keep them plain.
        let mut props = Properties::new();
        props.insert(READY_KEY.into(), true.into());
        props.insert(GAME_TIME_KEY.into(), 5i64.into());
        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json, serde_json::json!({ "GameTime": 5, "IsReady": true }));
    }

    #[test]
    fn test_property_value_accessors() {
        assert_eq!(PropertyValue::Bool(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::Int(3).as_bool(), None);
        assert_eq!(PropertyValue::Int(3).as_int(), Some(3));
        assert_eq!(PropertyValue::from("x").as_int(), None);
    }

    #[test]
    fn test_room_summary_joinable_and_ratio() {
        let mut room = RoomSummary {
            name: "arena".into(),
            participant_count: 2,
            max_participants: 4,
            is_open: true,
            removed: false,
        };
        assert!(room.is_joinable());
        assert_eq!(room.player_ratio(), "2 / 4");

        room.participant_count = 4;
        assert!(!room.is_joinable());

        room.participant_count = 1;
        room.is_open = false;
        assert!(!room.is_joinable());
    }

    #[test]
    fn test_room_summary_removed_defaults_to_false() {
        let json = r#"{"name":"a","participant_count":1,"max_participants":2,"is_open":true}"#;
        let room: RoomSummary = serde_json::from_str(json).unwrap();
        assert!(!room.removed);
    }

    #[test]
    fn test_join_failure_codes_are_distinct() {
        let codes = [
            JoinFailure::Full.code(),
            JoinFailure::Closed.code(),
            JoinFailure::NameCollision.code(),
            JoinFailure::NotFound.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
