//! `SessionContext` builder and tick loop.
//!
//! The context is the one object a participant constructs per session. It
//! owns the transport endpoint and every component, and hands each
//! component the others it needs by reference for the duration of a call.

use std::future::Future;
use std::time::Duration;

use glam::Vec3;
use rallypoint_combat::{ActionProtocol, CombatContext, Hit, SpawnPool};
use rallypoint_protocol::{EntityId, ParticipantId};
use rallypoint_replication::{EntityReplicator, Transform};
use rallypoint_room::{ClientPhase, RoomLifecycle};
use rallypoint_session::{MemoryStore, Roster, UserSettings};
use rallypoint_tick::{TickMetrics, TickScheduler};
use rallypoint_transport::{EventQueue, Transport, TransportEvent};
use tracing::{debug, error, info, warn};

use crate::{ClientConfig, ConfigError, NoticeSink, RallypointError};

/// Builder for a [`SessionContext`].
///
/// # Example
///
/// ```rust,ignore
/// let session = SessionContext::builder()
///     .config(config)
///     .transport(transport, events)
///     .spawn_pool(SpawnPool::new(points)?)
///     .notice_sink(sender)
///     .build()?;
/// ```
#[derive(Default)]
pub struct SessionContextBuilder {
    config: ClientConfig,
    transport: Option<(Box<dyn Transport>, EventQueue)>,
    spawn_pool: Option<SpawnPool>,
    sink: Option<Box<dyn NoticeSink>>,
    settings: Option<UserSettings>,
}

impl SessionContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// The transport endpoint and the queue its events arrive on.
    pub fn transport(mut self, transport: impl Transport, events: EventQueue) -> Self {
        self.transport = Some((Box::new(transport), events));
        self
    }

    pub fn spawn_pool(mut self, pool: SpawnPool) -> Self {
        self.spawn_pool = Some(pool);
        self
    }

    pub fn notice_sink(mut self, sink: impl NoticeSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Persisted user settings. Without them the session uses defaults kept
    /// in memory only.
    pub fn settings(mut self, settings: UserSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    /// [`ConfigError`] if the transport, spawn pool or notice sink is
    /// missing. These are fatal; the error is logged once here.
    pub fn build(self) -> Result<SessionContext, RallypointError> {
        let (transport, events) = self.transport.ok_or_else(|| missing(ConfigError::MissingTransport))?;
        let spawns = self.spawn_pool.ok_or_else(|| missing(ConfigError::MissingSpawnPool))?;
        let sink = self.sink.ok_or_else(|| missing(ConfigError::MissingNoticeSink))?;
        let settings = match self.settings {
            Some(settings) => settings,
            None => UserSettings::load(Box::new(MemoryStore::new()))?,
        };

        let config = self.config.validated();
        Ok(SessionContext {
            lifecycle: RoomLifecycle::new(config.lifecycle.clone()),
            replicator: EntityReplicator::new(config.replication.clone()),
            combat: ActionProtocol::new(config.combat.clone(), spawns),
            config,
            transport,
            events,
            settings,
            sink,
            phase: ClientPhase::Disconnected,
            trigger_held: false,
            aim: None,
        })
    }
}

fn missing(err: ConfigError) -> ConfigError {
    error!(error = %err, "session configuration incomplete");
    err
}

/// Everything one participant knows about its session.
pub struct SessionContext {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    events: EventQueue,
    lifecycle: RoomLifecycle,
    replicator: EntityReplicator,
    combat: ActionProtocol,
    settings: UserSettings,
    sink: Box<dyn NoticeSink>,
    /// Phase as of the last sync; edges against it start and stop combat.
    phase: ClientPhase,
    trigger_held: bool,
    aim: Option<Hit>,
}

impl SessionContext {
    pub fn builder() -> SessionContextBuilder {
        SessionContextBuilder::new()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn phase(&self) -> ClientPhase {
        self.lifecycle.phase()
    }

    pub fn lifecycle(&self) -> &RoomLifecycle {
        &self.lifecycle
    }

    pub fn roster(&self) -> &Roster {
        self.lifecycle.roster()
    }

    pub fn local_id(&self) -> Option<ParticipantId> {
        self.lifecycle.roster().local()
    }

    pub fn replicator(&self) -> &EntityReplicator {
        &self.replicator
    }

    pub fn combat(&self) -> &ActionProtocol {
        &self.combat
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    /// Settings changes are saved immediately; a new display name applies
    /// from the next connect.
    pub fn settings_mut(&mut self) -> &mut UserSettings {
        &mut self.settings
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Connects under the saved display name.
    pub fn connect(&mut self) -> Result<(), RallypointError> {
        let nickname = self.settings.display_name().to_string();
        self.lifecycle.connect(self.transport.as_mut(), &nickname)?;
        Ok(())
    }

    pub fn refresh_rooms(&mut self) -> Result<(), RallypointError> {
        self.lifecycle.refresh_rooms(self.transport.as_mut())?;
        Ok(())
    }

    pub fn create_room(&mut self, name: &str) -> Result<(), RallypointError> {
        self.lifecycle.create_room(self.transport.as_mut(), name)?;
        Ok(())
    }

    pub fn join_room(&mut self, name: &str) -> Result<(), RallypointError> {
        self.lifecycle.join_room(self.transport.as_mut(), name)?;
        Ok(())
    }

    /// Flips our readiness; `Ok(false)` if debounced.
    pub fn toggle_ready(&mut self) -> Result<bool, RallypointError> {
        Ok(self.lifecycle.toggle_ready(self.transport.as_mut())?)
    }

    pub fn leave(&mut self) -> Result<(), RallypointError> {
        self.lifecycle.leave(self.transport.as_mut())?;
        Ok(())
    }

    /// Trigger state for the coming ticks, and what a shot would hit right
    /// now.
    pub fn set_trigger(&mut self, held: bool, aim: Option<Hit>) {
        self.trigger_held = held;
        self.aim = aim;
    }

    /// Feeds the local movement result into our avatar. Returns `false` if
    /// we don't have an avatar (no match running).
    pub fn update_local_transform(&mut self, transform: Transform, velocity: Vec3) -> bool {
        match self.local_id() {
            Some(local) => {
                self.replicator
                    .update_owned(EntityId::avatar_of(local), transform, velocity)
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Runs one tick: drains transport events, advances the lifecycle,
    /// fires, publishes snapshots and smooths replicas, then hands the
    /// collected notices to the sink.
    ///
    /// Never fails; errors from individual steps are logged and the tick
    /// carries on.
    pub fn tick(&mut self, dt: Duration) {
        for event in self.events.drain() {
            self.route(&event);
            self.sync_phase();
        }

        if let Err(e) = self.lifecycle.tick(self.transport.as_mut(), dt) {
            warn!(error = %e, "lifecycle tick failed");
        }
        self.sync_phase();

        if self.phase.is_match_active() {
            let aim = self.aim;
            let mut ctx = CombatContext {
                transport: self.transport.as_mut(),
                roster: self.lifecycle.roster(),
                replicator: &mut self.replicator,
            };
            if let Err(e) = self.combat.trigger(&mut ctx, self.trigger_held, dt, || aim) {
                warn!(error = %e, "failed to fire");
            }
        }
        if self.phase.is_replicating() {
            self.replicator.tick(self.transport.as_mut(), dt);
        }
        self.combat.tick(dt);

        self.flush_notices();
    }

    /// Ticks at the configured rate until `shutdown` completes, then
    /// returns the scheduler's metrics.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> TickMetrics {
        let mut scheduler = TickScheduler::new(self.config.tick.clone());
        tokio::pin!(shutdown);
        info!(rate_hz = scheduler.tick_rate_hz(), "session loop running");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                next = scheduler.wait_for_tick() => {
                    self.tick(next.dt);
                    scheduler.record_tick_end();
                }
            }
        }

        info!(ticks = scheduler.tick_count(), "session loop stopped");
        scheduler.metrics().clone()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn route(&mut self, event: &TransportEvent) {
        // Read before the lifecycle drops them from the roster.
        let departed = match event {
            TransportEvent::ParticipantLeft(id) if self.lifecycle.phase().is_replicating() => {
                Some((*id, self.lifecycle.roster().nickname(*id)))
            }
            _ => None,
        };

        if let Err(e) = self.lifecycle.handle_event(self.transport.as_mut(), event) {
            warn!(error = %e, "failed to handle transport event");
        }

        match event {
            TransportEvent::SnapshotReceived {
                sender,
                entity,
                payload,
            } if self.lifecycle.phase().is_replicating() => {
                let now = self.transport.network_time_ms();
                let outcome = self.replicator.on_snapshot(*sender, *entity, payload, now);
                tracing::trace!(%sender, %entity, ?outcome, "snapshot");
            }
            TransportEvent::ActionInvoked { sender, payload } if self.lifecycle.phase().is_in_room() => {
                let mut ctx = CombatContext {
                    transport: self.transport.as_mut(),
                    roster: self.lifecycle.roster(),
                    replicator: &mut self.replicator,
                };
                if let Err(e) = self.combat.on_action(&mut ctx, *sender, payload) {
                    warn!(%sender, error = %e, "failed to apply action call");
                }
            }
            _ => {}
        }

        if let Some((id, nickname)) = departed {
            let mut ctx = CombatContext {
                transport: self.transport.as_mut(),
                roster: self.lifecycle.roster(),
                replicator: &mut self.replicator,
            };
            if let Err(e) = self.combat.participant_left(&mut ctx, id, &nickname) {
                warn!(participant = %id, error = %e, "failed to announce departure");
            }
        }
    }

    /// Starts combat on entering the match and drops it on leaving the room.
    fn sync_phase(&mut self) {
        let next = self.lifecycle.phase();
        if next == self.phase {
            return;
        }
        let prev = std::mem::replace(&mut self.phase, next);
        debug!(from = %prev, to = %next, "session phase");

        if next == ClientPhase::InMatch {
            let mut ctx = CombatContext {
                transport: self.transport.as_mut(),
                roster: self.lifecycle.roster(),
                replicator: &mut self.replicator,
            };
            if let Err(e) = self.combat.begin_match(&mut ctx) {
                warn!(error = %e, "failed to start combat");
            }
        }
        if prev.is_in_room() && !next.is_in_room() {
            self.combat.reset();
            self.replicator.clear();
            self.trigger_held = false;
            self.aim = None;
        }
    }

    fn flush_notices(&mut self) {
        for notice in self.lifecycle.drain_notices() {
            self.sink.notify(notice.into());
        }
        for notice in self.combat.drain_notices() {
            self.sink.notify(notice.into());
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("phase", &self.lifecycle.phase())
            .field("local", &self.local_id())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
