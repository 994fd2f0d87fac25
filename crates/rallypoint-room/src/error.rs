//! Error types for the room layer.

use rallypoint_protocol::JoinFailure;
use rallypoint_session::SessionError;
use rallypoint_transport::TransportError;

use crate::ClientPhase;

/// Errors returned by [`RoomLifecycle`](crate::RoomLifecycle) operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The join or create request was refused. Nothing changed.
    #[error("join rejected ({code}): {0}", code = .0.code())]
    JoinRejected(JoinFailure),

    /// Room names must contain something other than whitespace.
    #[error("room name must not be empty")]
    EmptyRoomName,

    /// The operation isn't valid in the current phase, e.g. toggling
    /// readiness from the lobby.
    #[error("cannot {operation} while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: ClientPhase,
    },

    /// The request couldn't be submitted to the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An event referred to a participant the roster doesn't know.
    #[error(transparent)]
    Session(#[from] SessionError),
}
