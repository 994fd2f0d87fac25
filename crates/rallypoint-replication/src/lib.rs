//! Owner-authoritative entity replication for Rallypoint.
//!
//! Every replicated entity has exactly one owner. The owner samples the
//! entity's transform each tick and publishes it as a timestamped
//! [`Snapshot`](rallypoint_protocol::Snapshot) on the unreliable channel,
//! no more often than the configured send rate. Everyone else keeps the
//! two newest snapshots and eases the displayed transform toward the
//! newest one, pushed ahead along its velocity to hide latency.
//!
//! Data only flows owner → replicas. A snapshot for an entity we own, from
//! a participant that doesn't own the entity, older than what we already
//! applied, or that doesn't decode is dropped. Replication never returns
//! an error.
//!
//! # Key types
//!
//! - [`EntityReplicator`] — owned and replica entities of one participant
//! - [`ReplicationConfig`] / [`SmoothingConfig`] — send rate and tunables
//! - [`Transform`] — position + rotation
//! - [`lag_compensation`] — the clamped prediction offset

mod config;
mod replicator;
mod transform;

pub use config::{ReplicationConfig, SmoothingConfig};
pub use replicator::{DropReason, EntityReplicator, SnapshotOutcome};
pub use transform::{lag_compensation, Transform};
