//! Codec trait and implementations for action and snapshot payloads.
//!
//! The transport moves opaque byte payloads. A [`Codec`] turns
//! [`ActionCall`](crate::ActionCall)s and [`Snapshot`](crate::Snapshot)s
//! into those bytes and back. Replication and combat only depend on the
//! trait, so a compact binary codec can replace [`JsonCodec`] without
//! touching them.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` so a codec can live inside the session context
/// that a tokio task drives.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, which makes captured traffic easy to inspect. Behind the
/// `json` feature (enabled by default).
///
/// ```rust
/// use rallypoint_protocol::{Action, ActionCall, Codec, JsonCodec, ParticipantId};
///
/// let codec = JsonCodec;
/// let call = ActionCall {
///     sender: ParticipantId(1),
///     seq: 1,
///     action: Action::Log { message: "Ana spawned.".into() },
/// };
///
/// let bytes = codec.encode(&call).unwrap();
/// let decoded: ActionCall = codec.decode(&bytes).unwrap();
/// assert_eq!(call, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
