use rallypoint_protocol::{ParticipantId, ProtocolError};
use rallypoint_transport::TransportError;

/// Errors returned by [`ActionProtocol`](crate::ActionProtocol) and the
/// spawn pool.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    /// A spawn pool needs at least one spawn point.
    #[error("spawn pool is empty")]
    EmptySpawnPool,

    /// An action named a participant we hold no combat record for.
    #[error("no combat record for {0}")]
    UnknownParticipant(ParticipantId),

    /// An action payload didn't encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The action couldn't be handed to the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
