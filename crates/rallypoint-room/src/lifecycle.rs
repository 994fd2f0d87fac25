//! The room lifecycle state machine.
//!
//! [`RoomLifecycle`] is fed transport events and tick deltas and turns them
//! into phase transitions. It owns the [`Roster`], the lobby's
//! [`RoomDirectory`] and the session timers; nothing else writes them.
//!
//! # Ready consensus
//!
//! The predicate is "at least two participants, all ready". It is
//! re-evaluated on every roster or property change:
//!
//! ```text
//! WaitingForReady ──(predicate becomes true)──→ CountdownPending
//! CountdownPending ──(next tick)──→ Countdown(3) ─1s→ Countdown(2) ─1s→ Countdown(1)
//! Countdown(1) ──1s──→ Starting ──(predicate still true)──→ InMatch
//! ```
//!
//! A roster change or the predicate turning false during the countdown
//! aborts it back to `WaitingForReady`; nothing from the aborted countdown
//! carries over.
//!
//! # Master departure
//!
//! The transport picks the successor. We don't continue under it: every
//! participant that sees a master change leaves the room, exactly once.

use std::time::Duration;

use rallypoint_protocol::{
    JoinFailure, ParticipantId, Properties, PropertyScope, PropertyValue, RoomOptions,
    GAME_TIME_KEY, READY_KEY,
};
use rallypoint_session::Roster;
use rallypoint_tick::{Countdown, Deadlines, SessionTimer, TimerEdge};
use rallypoint_transport::{DisconnectCause, ParticipantInfo, RoomInfo, Transport, TransportEvent};
use tracing::{debug, info, warn};

use crate::{ClientPhase, LifecycleConfig, LifecycleNotice, RoomDirectory, RoomError, RoomPhase};

/// Deadline key for the ready-toggle debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReadyToggle;

/// The local participant's view of the session lifecycle.
pub struct RoomLifecycle {
    config: LifecycleConfig,
    phase: ClientPhase,
    roster: Roster,
    directory: RoomDirectory,
    room_name: Option<String>,
    room_properties: Properties,
    local_ready: bool,
    /// One step of the pre-match countdown.
    step: Countdown,
    timer: SessionTimer,
    debounce: Deadlines<ReadyToggle>,
    leave_requested: bool,
    notices: Vec<LifecycleNotice>,
}

impl RoomLifecycle {
    pub fn new(config: LifecycleConfig) -> Self {
        let config = config.validated();
        Self {
            timer: SessionTimer::new(config.exit_grace),
            config,
            phase: ClientPhase::Disconnected,
            roster: Roster::new(),
            directory: RoomDirectory::new(),
            room_name: None,
            room_properties: Properties::new(),
            local_ready: false,
            step: Countdown::default(),
            debounce: Deadlines::new(),
            leave_requested: false,
            notices: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }

    /// Our readiness as last requested.
    pub fn local_ready(&self) -> bool {
        self.local_ready
    }

    /// The ready-consensus predicate.
    pub fn evaluate_readiness(&self) -> bool {
        self.roster.ready_consensus()
    }

    /// Match length: the room's `GameTime`, clamped, or the configured
    /// default if the room doesn't carry one.
    pub fn match_minutes(&self) -> u32 {
        self.room_properties
            .get(GAME_TIME_KEY)
            .and_then(PropertyValue::as_int)
            .map(LifecycleConfig::clamp_match_minutes)
            .unwrap_or(self.config.match_minutes)
    }

    /// Takes the notices collected since the last call.
    pub fn drain_notices(&mut self) -> Vec<LifecycleNotice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Starts connecting under `nickname`.
    pub fn connect(&mut self, transport: &mut dyn Transport, nickname: &str) -> Result<(), RoomError> {
        self.require("connect", self.phase == ClientPhase::Disconnected)?;
        transport.set_nickname(nickname);
        transport.connect()?;
        self.set_phase(ClientPhase::Connecting);
        info!(nickname, "connecting");
        Ok(())
    }

    /// Asks for a fresh room list.
    pub fn refresh_rooms(&mut self, transport: &mut dyn Transport) -> Result<(), RoomError> {
        self.require("list rooms", self.phase == ClientPhase::InLobby)?;
        transport.list_rooms()?;
        Ok(())
    }

    /// Creates a room and joins it as master.
    ///
    /// # Errors
    /// [`RoomError::JoinRejected`] with [`JoinFailure::NameCollision`] if
    /// the lobby already lists a room with this name. The phase doesn't
    /// change on any error.
    pub fn create_room(&mut self, transport: &mut dyn Transport, name: &str) -> Result<(), RoomError> {
        self.require("create a room", self.phase == ClientPhase::InLobby)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RoomError::EmptyRoomName);
        }
        if self.directory.contains(name) {
            debug!(room = name, "room name already listed");
            return Err(RoomError::JoinRejected(JoinFailure::NameCollision));
        }

        let mut properties = Properties::new();
        properties.insert(
            GAME_TIME_KEY.into(),
            i64::from(self.config.match_minutes).into(),
        );
        transport.create_or_join_room(
            name,
            RoomOptions {
                max_participants: self.config.max_participants,
                properties,
            },
        )?;
        self.directory.clear();
        self.set_phase(ClientPhase::JoiningRoom);
        info!(room = name, "creating room");
        Ok(())
    }

    /// Joins a listed room.
    ///
    /// # Errors
    /// [`RoomError::JoinRejected`] with `Closed` or `Full` if the directory
    /// already shows the room can't be joined. The phase doesn't change on
    /// any error.
    pub fn join_room(&mut self, transport: &mut dyn Transport, name: &str) -> Result<(), RoomError> {
        self.require("join a room", self.phase == ClientPhase::InLobby)?;
        if let Some(summary) = self.directory.get(name) {
            if !summary.is_open {
                return Err(RoomError::JoinRejected(JoinFailure::Closed));
            }
            if summary.participant_count >= summary.max_participants {
                return Err(RoomError::JoinRejected(JoinFailure::Full));
            }
        }
        transport.join_room(name)?;
        self.set_phase(ClientPhase::JoiningRoom);
        info!(room = name, "joining room");
        Ok(())
    }

    /// Flips our readiness.
    ///
    /// Returns `Ok(false)` without doing anything if the previous toggle
    /// was less than the debounce interval ago.
    pub fn toggle_ready(&mut self, transport: &mut dyn Transport) -> Result<bool, RoomError> {
        let local = match (self.phase, self.roster.local()) {
            (ClientPhase::InRoom(_), Some(local)) => local,
            _ => {
                return Err(RoomError::InvalidPhase {
                    operation: "toggle readiness",
                    phase: self.phase,
                })
            }
        };
        if self.debounce.is_pending(&ReadyToggle) {
            debug!("ready toggle ignored, too soon after the last one");
            return Ok(false);
        }
        self.publish_ready(transport, local, !self.local_ready)?;
        self.debounce
            .schedule(self.config.ready_toggle_debounce, ReadyToggle);
        Ok(true)
    }

    /// Leaves the current room.
    pub fn leave(&mut self, transport: &mut dyn Transport) -> Result<(), RoomError> {
        self.require("leave", self.phase.is_in_room())?;
        self.request_leave(transport)
    }

    // -----------------------------------------------------------------------
    // Transport events
    // -----------------------------------------------------------------------

    /// Applies one transport event.
    ///
    /// Room events that arrive while we aren't in a room (or are already
    /// leaving it) are ignored.
    pub fn handle_event(
        &mut self,
        transport: &mut dyn Transport,
        event: &TransportEvent,
    ) -> Result<(), RoomError> {
        match event {
            TransportEvent::Connected => {
                info!("connected");
                self.notices.push(LifecycleNotice::Connected);
                transport.join_lobby()?;
            }
            TransportEvent::Disconnected { cause } => self.on_disconnected(cause),
            TransportEvent::JoinedLobby => {
                self.local_ready = false;
                self.set_phase(ClientPhase::InLobby);
                self.notices.push(LifecycleNotice::EnteredLobby);
            }
            TransportEvent::RoomListUpdated(rooms) => {
                self.directory.apply(rooms);
                self.notices.push(LifecycleNotice::RoomListChanged);
            }
            TransportEvent::JoinedRoom { local, room } => {
                self.on_joined_room(transport, *local, room)?;
            }
            TransportEvent::JoinFailed { reason } => {
                if self.phase == ClientPhase::JoiningRoom {
                    self.set_phase(ClientPhase::InLobby);
                }
                info!(%reason, code = reason.code(), "join failed");
                self.notices
                    .push(LifecycleNotice::JoinFailed { reason: *reason });
            }
            TransportEvent::LeftRoom => self.on_left_room(transport)?,
            _ if !self.phase.is_in_room() => {}
            TransportEvent::ParticipantEntered(info) => self.on_participant_entered(info),
            TransportEvent::ParticipantLeft(id) => self.on_participant_left(*id),
            TransportEvent::PropertiesUpdated { scope, changed } => {
                self.on_properties_updated(*scope, changed)?;
            }
            TransportEvent::MasterChanged { new_master } => {
                if let Err(e) = self.roster.set_master(*new_master) {
                    warn!(%new_master, error = %e, "master change names a stranger");
                }
                info!(%new_master, "master changed, leaving room");
                self.notices.push(LifecycleNotice::MasterChanged {
                    new_master: *new_master,
                });
                self.request_leave(transport)?;
            }
            TransportEvent::SnapshotReceived { .. } | TransportEvent::ActionInvoked { .. } => {}
        }
        Ok(())
    }

    fn on_disconnected(&mut self, cause: &DisconnectCause) {
        warn!(%cause, phase = %self.phase, "disconnected");
        self.reset_room_state();
        self.directory.clear();
        self.set_phase(ClientPhase::Disconnected);
        self.notices.push(LifecycleNotice::Disconnected {
            cause: cause.clone(),
        });
    }

    fn on_joined_room(
        &mut self,
        transport: &mut dyn Transport,
        local: ParticipantId,
        room: &RoomInfo,
    ) -> Result<(), RoomError> {
        self.reset_room_state();
        self.roster.reset_from_room(local, room);
        self.room_name = Some(room.name.clone());
        self.room_properties = room.properties.clone();
        self.set_phase(ClientPhase::InRoom(RoomPhase::WaitingForReady));

        let is_master = self.roster.is_local_master();
        info!(room = %room.name, %local, is_master, "joined room");
        self.notices.push(LifecycleNotice::JoinedRoom {
            room: room.name.clone(),
            local,
            is_master,
        });

        self.publish_ready(transport, local, false)?;
        if is_master {
            let mut props = Properties::new();
            props.insert(
                GAME_TIME_KEY.into(),
                i64::from(self.config.match_minutes).into(),
            );
            transport.set_properties(PropertyScope::Room, props)?;
        }
        self.reevaluate(false);
        Ok(())
    }

    fn on_left_room(&mut self, transport: &mut dyn Transport) -> Result<(), RoomError> {
        info!(room = ?self.room_name, "left room");
        self.reset_room_state();
        self.notices.push(LifecycleNotice::LeftRoom);
        self.set_phase(ClientPhase::Connecting);
        transport.join_lobby()?;
        Ok(())
    }

    fn on_participant_entered(&mut self, info: &ParticipantInfo) {
        info!(participant = %info.id, nickname = %info.nickname, "participant entered");
        self.roster.insert(info.clone());
        self.notices.push(LifecycleNotice::ParticipantEntered {
            participant: info.id,
            nickname: info.nickname.clone(),
        });
        self.reevaluate(true);
    }

    fn on_participant_left(&mut self, id: ParticipantId) {
        match self.roster.remove(id) {
            Ok(session) => {
                info!(participant = %id, nickname = %session.nickname, "participant left");
                self.notices.push(LifecycleNotice::ParticipantLeft {
                    participant: id,
                    nickname: session.nickname,
                });
            }
            Err(e) => warn!(error = %e, "leave event for unknown participant"),
        }
        self.reevaluate(true);
    }

    fn on_properties_updated(
        &mut self,
        scope: PropertyScope,
        changed: &Properties,
    ) -> Result<(), RoomError> {
        match scope {
            PropertyScope::Room => {
                self.room_properties
                    .extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            PropertyScope::Session(id) => {
                self.roster.apply_properties(id, changed)?;
                if let Some(ready) = changed.get(READY_KEY).and_then(PropertyValue::as_bool) {
                    debug!(participant = %id, ready, "readiness updated");
                    self.notices.push(LifecycleNotice::ReadyChanged {
                        participant: id,
                        ready,
                    });
                }
                self.reevaluate(false);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advances countdowns and timers by one tick.
    pub fn tick(&mut self, transport: &mut dyn Transport, dt: Duration) -> Result<(), RoomError> {
        self.debounce.advance(dt);
        match self.phase {
            ClientPhase::InRoom(RoomPhase::CountdownPending) => {
                if self.evaluate_readiness() {
                    self.start_step(self.config.countdown_steps);
                } else {
                    self.set_phase(ClientPhase::InRoom(RoomPhase::WaitingForReady));
                }
            }
            ClientPhase::InRoom(RoomPhase::Countdown(remaining)) => {
                if self.step.tick(dt) {
                    if remaining > 1 {
                        self.start_step(remaining - 1);
                    } else {
                        self.set_phase(ClientPhase::InRoom(RoomPhase::Starting));
                        self.try_start_match(transport)?;
                    }
                }
            }
            ClientPhase::InMatch | ClientPhase::GameOver => match self.timer.tick(dt) {
                Some(TimerEdge::MatchEnded) => {
                    info!(room = ?self.room_name, "game over");
                    self.set_phase(ClientPhase::GameOver);
                    self.notices.push(LifecycleNotice::GameOver);
                }
                Some(TimerEdge::ExitElapsed) => self.request_leave(transport)?,
                None => {}
            },
            _ => {}
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require(&self, operation: &'static str, allowed: bool) -> Result<(), RoomError> {
        if allowed {
            Ok(())
        } else {
            Err(RoomError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn set_phase(&mut self, next: ClientPhase) {
        if self.phase != next {
            debug!(from = %self.phase, to = %next, "phase transition");
            self.phase = next;
        }
    }

    fn publish_ready(
        &mut self,
        transport: &mut dyn Transport,
        local: ParticipantId,
        ready: bool,
    ) -> Result<(), RoomError> {
        let mut props = Properties::new();
        props.insert(READY_KEY.into(), ready.into());
        transport.set_properties(PropertyScope::Session(local), props)?;
        self.local_ready = ready;
        Ok(())
    }

    /// Re-checks the ready predicate after a roster or property change.
    fn reevaluate(&mut self, roster_changed: bool) {
        let ClientPhase::InRoom(room_phase) = self.phase else {
            return;
        };
        let consensus = self.evaluate_readiness();
        match room_phase {
            RoomPhase::WaitingForReady if consensus => {
                info!(participants = self.roster.len(), "ready consensus reached");
                self.set_phase(ClientPhase::InRoom(RoomPhase::CountdownPending));
            }
            RoomPhase::WaitingForReady => {}
            RoomPhase::CountdownPending if !consensus => {
                self.set_phase(ClientPhase::InRoom(RoomPhase::WaitingForReady));
            }
            RoomPhase::CountdownPending => {}
            RoomPhase::Countdown(_) | RoomPhase::Starting => {
                if !consensus || roster_changed {
                    self.abort_countdown();
                    if consensus {
                        self.set_phase(ClientPhase::InRoom(RoomPhase::CountdownPending));
                    }
                }
            }
        }
    }

    fn start_step(&mut self, remaining: u8) {
        self.set_phase(ClientPhase::InRoom(RoomPhase::Countdown(remaining)));
        self.step.start(self.config.countdown_step);
        info!(remaining, "countdown");
        self.notices
            .push(LifecycleNotice::CountdownTick { remaining });
    }

    fn abort_countdown(&mut self) {
        self.step.cancel();
        self.set_phase(ClientPhase::InRoom(RoomPhase::WaitingForReady));
        info!("countdown aborted");
        self.notices.push(LifecycleNotice::CountdownAborted);
    }

    fn try_start_match(&mut self, transport: &mut dyn Transport) -> Result<(), RoomError> {
        if !self.evaluate_readiness() {
            self.abort_countdown();
            return Ok(());
        }
        let minutes = self.match_minutes();
        let duration = Duration::from_secs(u64::from(minutes) * 60);
        self.set_phase(ClientPhase::InMatch);
        self.timer.start_match(duration);
        info!(room = ?self.room_name, minutes, "match started");
        self.notices.push(LifecycleNotice::MatchStarted { duration });
        if self.roster.is_local_master() {
            transport.set_room_open(false)?;
        }
        Ok(())
    }

    fn request_leave(&mut self, transport: &mut dyn Transport) -> Result<(), RoomError> {
        if self.leave_requested {
            debug!("leave already requested");
            return Ok(());
        }
        self.leave_requested = true;
        self.cancel_timers();
        self.set_phase(ClientPhase::Exiting);
        info!(room = ?self.room_name, "leaving room");
        self.notices.push(LifecycleNotice::LeaveRequested);
        transport.leave_room()?;
        Ok(())
    }

    fn cancel_timers(&mut self) {
        self.step.cancel();
        self.timer.cancel();
        self.debounce.clear();
    }

    fn reset_room_state(&mut self) {
        self.cancel_timers();
        self.roster.clear();
        self.room_name = None;
        self.room_properties.clear();
        self.local_ready = false;
        self.leave_requested = false;
    }
}

impl std::fmt::Debug for RoomLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomLifecycle")
            .field("phase", &self.phase)
            .field("room", &self.room_name)
            .field("participants", &self.roster.len())
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
