//! Transport abstraction for Rallypoint.
//!
//! Rallypoint does not implement networking. It consumes a transport
//! collaborator through the [`Transport`] trait (requests) and a
//! [`EventQueue`] (results and remote happenings). Every request is
//! fire-and-forget: the call only submits it, and whatever comes of it is
//! delivered later as a [`TransportEvent`] that the session drains at its
//! next tick boundary. Nothing in here ever blocks the tick.
//!
//! Two delivery guarantees are assumed from any implementation:
//!
//! - [`Transport::invoke`] payloads from one sender reach every recipient
//!   reliably and in that sender's send order.
//! - [`Transport::publish_snapshot`] payloads are best effort: they may be
//!   lost, duplicated or reordered.
//!
//! # Feature Flags
//!
//! - `loopback` (default) — [`LoopbackHub`], an in-memory transport that
//!   connects several sessions inside one process.

mod error;
mod event;
#[cfg(feature = "loopback")]
mod loopback;

pub use error::TransportError;
pub use event::{
    event_queue, DisconnectCause, EventQueue, EventSender, ParticipantInfo, RoomInfo,
    TransportEvent,
};
#[cfg(feature = "loopback")]
pub use loopback::{LoopbackHub, LoopbackTransport};

use rallypoint_protocol::{EntityId, Properties, PropertyScope, RoomOptions, Target};

/// The request side of the transport collaborator.
///
/// Methods return `Err` only when a request can't be submitted at all
/// (no connection, not in a room). Refusals by the remote side — a full
/// room, a closed room — come back as events.
pub trait Transport: Send + 'static {
    /// Sets the display name other participants will see for us.
    fn set_nickname(&mut self, nickname: &str);

    /// Opens the connection. Completion: [`TransportEvent::Connected`].
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Enters the lobby. Completion: [`TransportEvent::JoinedLobby`]
    /// followed by a [`TransportEvent::RoomListUpdated`].
    fn join_lobby(&mut self) -> Result<(), TransportError>;

    /// Joins the named room, creating it with `options` if it doesn't exist.
    fn create_or_join_room(
        &mut self,
        name: &str,
        options: RoomOptions,
    ) -> Result<(), TransportError>;

    /// Joins an existing room. Completion: [`TransportEvent::JoinedRoom`]
    /// or [`TransportEvent::JoinFailed`].
    fn join_room(&mut self, name: &str) -> Result<(), TransportError>;

    /// Leaves the current room. Completion: [`TransportEvent::LeftRoom`].
    fn leave_room(&mut self) -> Result<(), TransportError>;

    /// Requests a fresh room list ([`TransportEvent::RoomListUpdated`]).
    fn list_rooms(&mut self) -> Result<(), TransportError>;

    /// Merges `properties` into a session's or the room's custom
    /// properties. Every room member, the caller included, receives the
    /// change as [`TransportEvent::PropertiesUpdated`].
    fn set_properties(
        &mut self,
        scope: PropertyScope,
        properties: Properties,
    ) -> Result<(), TransportError>;

    /// Opens or closes the current room to new joins.
    fn set_room_open(&mut self, open: bool) -> Result<(), TransportError>;

    /// Sends an action payload on the reliable, sender-ordered channel.
    fn invoke(&mut self, target: Target, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Sends a snapshot payload on the unreliable channel to every other
    /// room member.
    fn publish_snapshot(
        &mut self,
        entity: EntityId,
        payload: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Network time in milliseconds, synchronized across participants.
    fn network_time_ms(&self) -> u64;
}
