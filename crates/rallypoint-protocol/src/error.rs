//! Error types for the protocol layer.
//!
//! Each Rallypoint crate defines its own error enum. A `ProtocolError`
//! always means a payload could not be turned into bytes or back, never
//! that the network or a room misbehaved.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: truncated payloads, a peer running an incompatible
    /// build, or a snapshot routed to the action channel by mistake.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload decoded but violates a protocol rule
    /// (e.g. a property value of the wrong type for a well-known key).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
