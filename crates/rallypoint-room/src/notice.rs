//! What the lifecycle tells the layers above it.

use std::time::Duration;

use rallypoint_protocol::{JoinFailure, ParticipantId};
use rallypoint_transport::DisconnectCause;

/// A lifecycle happening worth reacting to or showing.
///
/// Collected while events and ticks are processed and handed out by
/// [`RoomLifecycle::drain_notices`](crate::RoomLifecycle::drain_notices),
/// in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleNotice {
    Connected,
    Disconnected { cause: DisconnectCause },
    EnteredLobby,
    /// The room directory changed.
    RoomListChanged,
    JoinedRoom {
        room: String,
        local: ParticipantId,
        is_master: bool,
    },
    JoinFailed { reason: JoinFailure },
    ParticipantEntered {
        participant: ParticipantId,
        nickname: String,
    },
    ParticipantLeft {
        participant: ParticipantId,
        nickname: String,
    },
    ReadyChanged { participant: ParticipantId, ready: bool },
    /// A countdown step is showing `remaining` ("3", "2", "1").
    CountdownTick { remaining: u8 },
    CountdownAborted,
    MatchStarted { duration: Duration },
    GameOver,
    MasterChanged { new_master: ParticipantId },
    /// We asked the transport to take us out of the room.
    LeaveRequested,
    LeftRoom,
}
