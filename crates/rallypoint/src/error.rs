//! Unified error type for Rallypoint.

use rallypoint_combat::CombatError;
use rallypoint_protocol::ProtocolError;
use rallypoint_room::RoomError;
use rallypoint_session::SessionError;
use rallypoint_transport::TransportError;

/// A required collaborator was not supplied to
/// [`SessionContextBuilder::build`](crate::SessionContextBuilder::build).
///
/// Fatal: the session can't start without it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no transport configured")]
    MissingTransport,

    #[error("no spawn pool configured")]
    MissingSpawnPool,

    #[error("no notice sink configured")]
    MissingNoticeSink,
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RallypointError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use rallypoint_protocol::{JoinFailure, ParticipantId};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: RallypointError = TransportError::NotInRoom.into();
        assert!(matches!(err, RallypointError::Transport(_)));
        assert_eq!(err.to_string(), "not in a room");
    }

    #[test]
    fn test_from_room_error_keeps_reason() {
        let err: RallypointError = RoomError::JoinRejected(JoinFailure::Full).into();
        assert!(matches!(
            err,
            RallypointError::Room(RoomError::JoinRejected(JoinFailure::Full))
        ));
    }

    #[test]
    fn test_from_combat_error() {
        let err: RallypointError = CombatError::UnknownParticipant(ParticipantId(4)).into();
        assert!(err.to_string().contains("P-4"));
    }

    #[test]
    fn test_config_error_display() {
        let err: RallypointError = ConfigError::MissingSpawnPool.into();
        assert_eq!(err.to_string(), "configuration error: no spawn pool configured");
    }
}
