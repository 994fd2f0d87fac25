/// Errors that can occur in the transport layer.
///
/// These are *submission* errors: a request that could not even be handed
/// to the network. Outcomes of accepted requests (join refused, peer left)
/// arrive later as [`TransportEvent`](crate::TransportEvent)s.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The operation needs a live connection and there isn't one.
    #[error("not connected")]
    NotConnected,

    /// The operation needs the caller to be in a room.
    #[error("not in a room")]
    NotInRoom,

    /// The caller is already in a room and must leave it first.
    #[error("already in room {0}")]
    AlreadyInRoom(String),

    /// The remote side refused the request outright.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
