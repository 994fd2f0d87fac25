//! Per-entity owner → replica channels.

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec3;
use rallypoint_protocol::{Codec, EntityId, JsonCodec, ParticipantId, Snapshot};
use rallypoint_transport::Transport;
use tracing::{debug, trace, warn};

use crate::{lag_compensation, ReplicationConfig, Transform};

/// Why a received snapshot was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The payload didn't decode, or names a different entity.
    Malformed,
    /// No replica is registered for the entity.
    UnknownEntity,
    /// We own the entity; remote data never writes owned state.
    OwnedLocally,
    /// Sent by someone other than the entity's owner.
    WrongSender,
    /// Not newer than the last snapshot applied.
    Stale,
}

/// What [`EntityReplicator::on_snapshot`] did with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Became the replica's new target. `snapped` means the displayed
    /// transform jumped straight to it instead of smoothing.
    Applied { snapped: bool },
    Dropped(DropReason),
}

#[derive(Debug)]
struct OwnedEntity {
    owner: ParticipantId,
    transform: Transform,
    velocity: Vec3,
    epoch: u32,
    since_send: Duration,
    force_send: bool,
}

#[derive(Debug)]
struct ReplicaEntity {
    owner: ParticipantId,
    displayed: Transform,
    target: Transform,
    velocity: Vec3,
    target_velocity: Vec3,
    previous: Option<Snapshot>,
    latest: Option<Snapshot>,
}

/// The replicated entities of one participant.
///
/// Owned entities are sampled through [`update_owned`](Self::update_owned)
/// and published from [`tick`](Self::tick). Replicas are written only by
/// [`on_snapshot`](Self::on_snapshot) and eased toward their target on
/// every tick.
pub struct EntityReplicator<C: Codec = JsonCodec> {
    config: ReplicationConfig,
    codec: C,
    owned: BTreeMap<EntityId, OwnedEntity>,
    replicas: BTreeMap<EntityId, ReplicaEntity>,
}

impl EntityReplicator<JsonCodec> {
    pub fn new(config: ReplicationConfig) -> Self {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: Codec> EntityReplicator<C> {
    pub fn with_codec(config: ReplicationConfig, codec: C) -> Self {
        Self {
            config: config.validated(),
            codec,
            owned: BTreeMap::new(),
            replicas: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Registers an entity we own. Its first snapshot goes out on the next tick.
    pub fn spawn_owned(&mut self, entity: EntityId, owner: ParticipantId, transform: Transform) {
        self.replicas.remove(&entity);
        self.owned.insert(
            entity,
            OwnedEntity {
                owner,
                transform,
                velocity: Vec3::ZERO,
                epoch: 0,
                since_send: self.config.send_interval(),
                force_send: false,
            },
        );
        debug!(%entity, %owner, "owned entity spawned");
    }

    /// Registers an entity owned by `owner`, displayed at `transform` until
    /// its first snapshot arrives.
    ///
    /// Does nothing if we already own the entity: ownership never moves.
    pub fn spawn_replica(&mut self, entity: EntityId, owner: ParticipantId, transform: Transform) {
        if self.owned.contains_key(&entity) {
            warn!(%entity, %owner, "refusing to replicate an entity we own");
            return;
        }
        self.replicas.insert(
            entity,
            ReplicaEntity {
                owner,
                displayed: transform,
                target: transform,
                velocity: Vec3::ZERO,
                target_velocity: Vec3::ZERO,
                previous: None,
                latest: None,
            },
        );
        debug!(%entity, %owner, "replica spawned");
    }

    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let removed = self.owned.remove(&entity).is_some() || self.replicas.remove(&entity).is_some();
        if removed {
            debug!(%entity, "entity despawned");
        }
        removed
    }

    /// Forgets every entity.
    pub fn clear(&mut self) {
        self.owned.clear();
        self.replicas.clear();
    }

    pub fn is_owned(&self, entity: EntityId) -> bool {
        self.owned.contains_key(&entity)
    }

    pub fn is_replica(&self, entity: EntityId) -> bool {
        self.replicas.contains_key(&entity)
    }

    /// Records the latest local sample of an owned entity.
    ///
    /// Returns `false` (and changes nothing) for entities we don't own.
    pub fn update_owned(&mut self, entity: EntityId, transform: Transform, velocity: Vec3) -> bool {
        match self.owned.get_mut(&entity) {
            Some(owned) => {
                owned.transform = transform;
                owned.velocity = velocity;
                true
            }
            None => false,
        }
    }

    /// Teleports an owned entity.
    ///
    /// The move is atomic from the replicas' point of view: the epoch is
    /// bumped, velocity zeroed and a snapshot forced on the next tick, so
    /// nobody smooths across the jump.
    pub fn relocate(&mut self, entity: EntityId, transform: Transform) -> bool {
        let Some(owned) = self.owned.get_mut(&entity) else {
            return false;
        };
        owned.transform = transform;
        owned.velocity = Vec3::ZERO;
        owned.epoch = owned.epoch.wrapping_add(1);
        owned.force_send = true;
        debug!(%entity, epoch = owned.epoch, position = ?transform.position, "entity relocated");
        true
    }

    /// Authoritative transform for owned entities, displayed transform for
    /// replicas.
    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.owned
            .get(&entity)
            .map(|o| o.transform)
            .or_else(|| self.replicas.get(&entity).map(|r| r.displayed))
    }

    /// Sampled velocity for owned entities, eased velocity for replicas.
    pub fn velocity(&self, entity: EntityId) -> Option<Vec3> {
        self.owned
            .get(&entity)
            .map(|o| o.velocity)
            .or_else(|| self.replicas.get(&entity).map(|r| r.velocity))
    }

    /// Where a replica is being eased toward (newest snapshot plus the lag
    /// offset).
    pub fn target(&self, entity: EntityId) -> Option<Transform> {
        self.replicas.get(&entity).map(|r| r.target)
    }

    pub fn epoch(&self, entity: EntityId) -> Option<u32> {
        if let Some(owned) = self.owned.get(&entity) {
            return Some(owned.epoch);
        }
        self.replicas
            .get(&entity)
            .and_then(|r| r.latest.as_ref())
            .map(|s| s.epoch)
    }

    /// The two most recent snapshots applied to a replica, older first.
    pub fn snapshots(&self, entity: EntityId) -> Option<(Option<&Snapshot>, &Snapshot)> {
        let replica = self.replicas.get(&entity)?;
        let latest = replica.latest.as_ref()?;
        Some((replica.previous.as_ref(), latest))
    }

    /// Publishes due snapshots of owned entities, then smooths replicas.
    ///
    /// Returns the number of snapshots published. A failed publish is
    /// logged and retried on the next due tick.
    pub fn tick(&mut self, transport: &mut dyn Transport, dt: Duration) -> usize {
        let interval = self.config.send_interval();
        let now_ms = transport.network_time_ms();
        let mut published = 0;

        for (&entity, owned) in &mut self.owned {
            owned.since_send += dt;
            if owned.since_send < interval && !owned.force_send {
                continue;
            }
            let snapshot = Snapshot {
                entity,
                owner: owned.owner,
                timestamp_ms: now_ms,
                epoch: owned.epoch,
                position: owned.transform.position,
                rotation: owned.transform.rotation,
                velocity: owned.velocity,
            };
            let payload = match self.codec.encode(&snapshot) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(%entity, error = %e, "failed to encode snapshot");
                    continue;
                }
            };
            match transport.publish_snapshot(entity, payload) {
                Ok(()) => {
                    owned.since_send = Duration::ZERO;
                    owned.force_send = false;
                    published += 1;
                    trace!(%entity, timestamp_ms = now_ms, "snapshot published");
                }
                Err(e) => warn!(%entity, error = %e, "failed to publish snapshot"),
            }
        }

        let dt = dt.as_secs_f32();
        let velocity_t = (self.config.smoothing.position_rate * dt).min(Vec3::ONE);
        for replica in self.replicas.values_mut() {
            replica.displayed = replica
                .displayed
                .smooth_toward(&replica.target, &self.config.smoothing, dt);
            replica.velocity += (replica.target_velocity - replica.velocity) * velocity_t;
        }

        published
    }

    /// Applies a snapshot received from `sender` at network time `now_ms`.
    ///
    /// Never fails: anything that can't be applied is dropped and the
    /// reason returned.
    pub fn on_snapshot(
        &mut self,
        sender: ParticipantId,
        entity: EntityId,
        payload: &[u8],
        now_ms: u64,
    ) -> SnapshotOutcome {
        if self.owned.contains_key(&entity) {
            warn!(%entity, %sender, "snapshot for an owned entity ignored");
            return SnapshotOutcome::Dropped(DropReason::OwnedLocally);
        }
        let snapshot: Snapshot = match self.codec.decode(payload) {
            Ok(s) => s,
            Err(e) => {
                debug!(%entity, %sender, error = %e, "malformed snapshot dropped");
                return SnapshotOutcome::Dropped(DropReason::Malformed);
            }
        };
        if snapshot.entity != entity {
            debug!(%entity, named = %snapshot.entity, "snapshot names another entity");
            return SnapshotOutcome::Dropped(DropReason::Malformed);
        }
        let Some(replica) = self.replicas.get_mut(&entity) else {
            trace!(%entity, %sender, "snapshot for unknown entity dropped");
            return SnapshotOutcome::Dropped(DropReason::UnknownEntity);
        };
        if sender != replica.owner || snapshot.owner != replica.owner {
            warn!(%entity, %sender, owner = %replica.owner, "snapshot from a non-owner");
            return SnapshotOutcome::Dropped(DropReason::WrongSender);
        }
        if let Some(latest) = &replica.latest {
            if snapshot.timestamp_ms <= latest.timestamp_ms {
                trace!(%entity, timestamp_ms = snapshot.timestamp_ms, "stale snapshot dropped");
                return SnapshotOutcome::Dropped(DropReason::Stale);
            }
        }

        let latency_ms = now_ms.abs_diff(snapshot.timestamp_ms);
        let offset = lag_compensation(
            latency_ms,
            snapshot.velocity,
            self.config.compensation_factor,
            self.config.max_offset,
        );
        replica.target = Transform {
            position: snapshot.position + offset,
            rotation: snapshot.rotation,
        };
        replica.target_velocity = snapshot.velocity;

        let snapped = replica
            .latest
            .as_ref()
            .is_none_or(|latest| latest.epoch != snapshot.epoch);
        if snapped {
            replica.displayed = replica.target;
            replica.velocity = replica.target_velocity;
            debug!(%entity, epoch = snapshot.epoch, "replica snapped");
        }
        trace!(%entity, latency_ms, ?offset, "snapshot applied");

        replica.previous = replica.latest.replace(snapshot);
        SnapshotOutcome::Applied { snapped }
    }
}
