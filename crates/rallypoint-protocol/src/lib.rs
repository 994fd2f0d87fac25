//! Wire protocol for Rallypoint.
//!
//! This crate defines everything that crosses the network between
//! participants of a shared session:
//!
//! - **Identity and room types** ([`ParticipantId`], [`EntityId`],
//!   [`RoomSummary`], [`Properties`], etc.) — what the transport reports
//!   about rooms and the people in them.
//! - **Snapshots** ([`Snapshot`]) — owner-published transform samples sent
//!   on the unreliable channel.
//! - **Action calls** ([`ActionCall`], [`Action`]) — combat operations
//!   broadcast on the reliable, sender-ordered channel and executed by
//!   every receiver.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those payloads
//!   become bytes.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (which moves opaque
//! payloads) and the session components (which interpret them). It knows
//! nothing about phases, rosters, or health.
//!
//! ```text
//! Transport (bytes) → Protocol (Snapshot / ActionCall) → Replication / Combat
//! ```

mod action;
mod codec;
mod error;
mod snapshot;
mod types;

pub use action::{Action, ActionCall};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use snapshot::Snapshot;
pub use types::{
    Channel, EntityId, JoinFailure, ParticipantId, Properties, PropertyScope,
    PropertyValue, RoomOptions, RoomSummary, Target, GAME_TIME_KEY, READY_KEY,
};
