//! In-memory transport connecting several sessions inside one process.
//!
//! [`LoopbackHub`] plays the role of the relay server: it owns the rooms,
//! assigns participant ids, elects the oldest joiner as master when the
//! master leaves, and fans requests out as events. Delivery is immediate
//! (into each endpoint's queue) and in call order, which satisfies both
//! the reliable-ordered and the best-effort contracts.
//!
//! The network clock is either wall time since the hub was created or a
//! manual clock that tests advance explicitly.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use rallypoint_protocol::{
    EntityId, JoinFailure, ParticipantId, Properties, PropertyScope, RoomOptions,
    RoomSummary, Target,
};

use crate::{
    event_queue, DisconnectCause, EventQueue, EventSender, ParticipantInfo, RoomInfo,
    Transport, TransportError, TransportEvent,
};

type ClientKey = u64;

enum Clock {
    Wall(Instant),
    Manual(u64),
}

struct Client {
    events: EventSender,
    nickname: String,
    connected: bool,
    in_lobby: bool,
    room: Option<String>,
    participant: Option<ParticipantId>,
}

struct Member {
    id: ParticipantId,
    client: ClientKey,
    properties: Properties,
}

struct Room {
    max_participants: usize,
    is_open: bool,
    master: ParticipantId,
    properties: Properties,
    /// Oldest joiner first.
    members: Vec<Member>,
}

impl Room {
    fn summary(&self, name: &str) -> RoomSummary {
        RoomSummary {
            name: name.to_string(),
            participant_count: self.members.len(),
            max_participants: self.max_participants,
            is_open: self.is_open,
            removed: false,
        }
    }
}

struct HubState {
    clock: Clock,
    next_client: ClientKey,
    next_participant: u32,
    clients: HashMap<ClientKey, Client>,
    rooms: BTreeMap<String, Room>,
}

impl HubState {
    fn send(&self, client: ClientKey, event: TransportEvent) {
        if let Some(c) = self.clients.get(&client) {
            c.events.push(event);
        }
    }

    fn client(&self, key: ClientKey) -> Result<&Client, TransportError> {
        self.clients
            .get(&key)
            .filter(|c| c.connected)
            .ok_or(TransportError::NotConnected)
    }

    fn current_room(&self, key: ClientKey) -> Result<(String, ParticipantId), TransportError> {
        let client = self.client(key)?;
        match (&client.room, client.participant) {
            (Some(room), Some(pid)) => Ok((room.clone(), pid)),
            _ => Err(TransportError::NotInRoom),
        }
    }

    fn nickname_of(&self, key: ClientKey) -> String {
        self.clients
            .get(&key)
            .map(|c| c.nickname.clone())
            .unwrap_or_default()
    }

    fn participant_info(&self, member: &Member) -> ParticipantInfo {
        ParticipantInfo {
            id: member.id,
            nickname: self.nickname_of(member.client),
            properties: member.properties.clone(),
        }
    }

    fn room_list(&self) -> Vec<RoomSummary> {
        self.rooms
            .iter()
            .map(|(name, room)| room.summary(name))
            .collect()
    }

    /// Sends a room-list delta to every client sitting in the lobby.
    fn publish_room_delta(&self, summary: RoomSummary) {
        for (key, client) in &self.clients {
            if client.connected && client.in_lobby {
                self.send(*key, TransportEvent::RoomListUpdated(vec![summary.clone()]));
            }
        }
    }

    fn broadcast_room(&self, room: &Room, except: Option<ParticipantId>, event: &TransportEvent) {
        for member in &room.members {
            if Some(member.id) != except {
                self.send(member.client, event.clone());
            }
        }
    }

    fn ensure_not_in_room(&self, key: ClientKey) -> Result<(), TransportError> {
        match &self.client(key)?.room {
            Some(room) => Err(TransportError::AlreadyInRoom(room.clone())),
            None => Ok(()),
        }
    }

    fn create_room(&mut self, key: ClientKey, name: &str, options: RoomOptions) {
        let id = self.allocate_participant();
        let room = Room {
            max_participants: options.max_participants,
            is_open: true,
            master: id,
            properties: options.properties,
            members: vec![Member {
                id,
                client: key,
                properties: Properties::new(),
            }],
        };
        tracing::debug!(room = name, participant = %id, "loopback room created");
        self.rooms.insert(name.to_string(), room);
        self.admit(key, name, id);
    }

    fn join_existing(&mut self, key: ClientKey, name: &str) {
        let refusal = match self.rooms.get(name) {
            None => Some(JoinFailure::NotFound),
            Some(room) if !room.is_open => Some(JoinFailure::Closed),
            Some(room) if room.members.len() >= room.max_participants => Some(JoinFailure::Full),
            Some(_) => None,
        };
        if let Some(reason) = refusal {
            self.send(key, TransportEvent::JoinFailed { reason });
            return;
        }

        let id = self.allocate_participant();
        let Some(room) = self.rooms.get_mut(name) else {
            return;
        };
        room.members.push(Member {
            id,
            client: key,
            properties: Properties::new(),
        });
        self.admit(key, name, id);

        if let Some(room) = self.rooms.get(name) {
            if let Some(member) = room.members.last() {
                let entered = TransportEvent::ParticipantEntered(self.participant_info(member));
                self.broadcast_room(room, Some(id), &entered);
            }
        }
    }

    /// Marks `key` as a member of `name` and tells it so.
    fn admit(&mut self, key: ClientKey, name: &str, id: ParticipantId) {
        if let Some(client) = self.clients.get_mut(&key) {
            client.in_lobby = false;
            client.room = Some(name.to_string());
            client.participant = Some(id);
        }
        let Some(room) = self.rooms.get(name) else {
            return;
        };
        let info = RoomInfo {
            name: name.to_string(),
            max_participants: room.max_participants,
            is_open: room.is_open,
            master: room.master,
            properties: room.properties.clone(),
            participants: room
                .members
                .iter()
                .map(|m| self.participant_info(m))
                .collect(),
        };
        self.send(key, TransportEvent::JoinedRoom { local: id, room: info });
        self.publish_room_delta(room.summary(name));
    }

    /// Removes `key` from its room, electing a new master if needed.
    fn remove_member(&mut self, key: ClientKey, notify_self: bool) {
        let Some(client) = self.clients.get_mut(&key) else {
            return;
        };
        let (Some(name), Some(id)) = (client.room.take(), client.participant.take()) else {
            return;
        };
        if notify_self {
            self.send(key, TransportEvent::LeftRoom);
        }

        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };
        room.members.retain(|m| m.id != id);

        if room.members.is_empty() {
            self.rooms.remove(&name);
            tracing::debug!(room = %name, "loopback room emptied and removed");
            self.publish_room_delta(RoomSummary {
                name,
                participant_count: 0,
                max_participants: 0,
                is_open: false,
                removed: true,
            });
            return;
        }

        let mut new_master = None;
        if room.master == id {
            room.master = room.members[0].id;
            new_master = Some(room.master);
        }

        let Some(room) = self.rooms.get(&name) else {
            return;
        };
        self.broadcast_room(room, None, &TransportEvent::ParticipantLeft(id));
        if let Some(new_master) = new_master {
            tracing::debug!(room = %name, %new_master, "loopback master reassigned");
            self.broadcast_room(room, None, &TransportEvent::MasterChanged { new_master });
        }
        self.publish_room_delta(room.summary(&name));
    }

    fn allocate_participant(&mut self) -> ParticipantId {
        self.next_participant += 1;
        ParticipantId(self.next_participant)
    }

    fn now_ms(&self) -> u64 {
        match self.clock {
            Clock::Wall(start) => start.elapsed().as_millis() as u64,
            Clock::Manual(ms) => ms,
        }
    }
}

/// The in-memory relay shared by every [`LoopbackTransport`] it creates.
///
/// Cheap to clone; clones share the same rooms and clock.
#[derive(Clone)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    /// Creates a hub whose network clock follows wall time.
    pub fn new() -> Self {
        Self::with_clock(Clock::Wall(Instant::now()))
    }

    /// Creates a hub whose network clock only moves through
    /// [`advance_clock`](Self::advance_clock).
    pub fn with_manual_clock() -> Self {
        Self::with_clock(Clock::Manual(0))
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                clock,
                next_client: 0,
                next_participant: 0,
                clients: HashMap::new(),
                rooms: BTreeMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a new endpoint and the queue its events arrive on.
    pub fn endpoint(&self) -> (LoopbackTransport, EventQueue) {
        let (events, queue) = event_queue();
        let mut state = self.lock();
        state.next_client += 1;
        let key = state.next_client;
        state.clients.insert(
            key,
            Client {
                events,
                nickname: String::new(),
                connected: false,
                in_lobby: false,
                room: None,
                participant: None,
            },
        );
        drop(state);
        (
            LoopbackTransport {
                hub: self.clone(),
                key,
            },
            queue,
        )
    }

    /// Moves a manual clock forward. No effect on a wall clock.
    pub fn advance_clock(&self, ms: u64) {
        if let Clock::Manual(now) = &mut self.lock().clock {
            *now += ms;
        }
    }

    /// Severs the connection of `participant` as if the network failed.
    ///
    /// The participant receives `Disconnected`; the rest of its room sees it
    /// leave (and a master change if it was the master).
    pub fn drop_connection(&self, participant: ParticipantId) {
        let mut state = self.lock();
        let key = state
            .clients
            .iter()
            .find(|(_, c)| c.participant == Some(participant))
            .map(|(k, _)| *k);
        let Some(key) = key else {
            return;
        };
        state.remove_member(key, false);
        if let Some(client) = state.clients.get_mut(&key) {
            client.connected = false;
            client.in_lobby = false;
        }
        state.send(
            key,
            TransportEvent::Disconnected {
                cause: DisconnectCause::Timeout,
            },
        );
        tracing::debug!(%participant, "loopback connection dropped");
    }

    /// Current summaries of every room, ordered by name.
    pub fn rooms(&self) -> Vec<RoomSummary> {
        self.lock().room_list()
    }
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One participant's endpoint on a [`LoopbackHub`].
pub struct LoopbackTransport {
    hub: LoopbackHub,
    key: ClientKey,
}

impl Transport for LoopbackTransport {
    fn set_nickname(&mut self, nickname: &str) {
        if let Some(client) = self.hub.lock().clients.get_mut(&self.key) {
            client.nickname = nickname.to_string();
        }
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        let client = state
            .clients
            .get_mut(&self.key)
            .ok_or(TransportError::Shutdown)?;
        client.connected = true;
        state.send(self.key, TransportEvent::Connected);
        Ok(())
    }

    fn join_lobby(&mut self) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        state.ensure_not_in_room(self.key)?;
        if let Some(client) = state.clients.get_mut(&self.key) {
            client.in_lobby = true;
        }
        state.send(self.key, TransportEvent::JoinedLobby);
        let list = state.room_list();
        state.send(self.key, TransportEvent::RoomListUpdated(list));
        Ok(())
    }

    fn create_or_join_room(
        &mut self,
        name: &str,
        options: RoomOptions,
    ) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        state.ensure_not_in_room(self.key)?;
        if state.rooms.contains_key(name) {
            state.join_existing(self.key, name);
        } else {
            state.create_room(self.key, name, options);
        }
        Ok(())
    }

    fn join_room(&mut self, name: &str) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        state.ensure_not_in_room(self.key)?;
        state.join_existing(self.key, name);
        Ok(())
    }

    fn leave_room(&mut self) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        state.current_room(self.key)?;
        state.remove_member(self.key, true);
        Ok(())
    }

    fn list_rooms(&mut self) -> Result<(), TransportError> {
        let state = self.hub.lock();
        state.client(self.key)?;
        state.send(self.key, TransportEvent::RoomListUpdated(state.room_list()));
        Ok(())
    }

    fn set_properties(
        &mut self,
        scope: PropertyScope,
        properties: Properties,
    ) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        let (name, me) = state.current_room(self.key)?;
        let Some(room) = state.rooms.get_mut(&name) else {
            return Err(TransportError::NotInRoom);
        };
        match scope {
            PropertyScope::Session(target) => {
                if target != me {
                    return Err(TransportError::Rejected(format!(
                        "{me} may not write properties of {target}"
                    )));
                }
                if let Some(member) = room.members.iter_mut().find(|m| m.id == me) {
                    member.properties.extend(properties.clone());
                }
            }
            PropertyScope::Room => room.properties.extend(properties.clone()),
        }
        let event = TransportEvent::PropertiesUpdated {
            scope,
            changed: properties,
        };
        if let Some(room) = state.rooms.get(&name) {
            state.broadcast_room(room, None, &event);
        }
        Ok(())
    }

    fn set_room_open(&mut self, open: bool) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        let (name, me) = state.current_room(self.key)?;
        let Some(room) = state.rooms.get_mut(&name) else {
            return Err(TransportError::NotInRoom);
        };
        if room.master != me {
            return Err(TransportError::Rejected(
                "only the master may open or close the room".into(),
            ));
        }
        room.is_open = open;
        let summary = room.summary(&name);
        state.publish_room_delta(summary);
        Ok(())
    }

    fn invoke(&mut self, target: Target, payload: Vec<u8>) -> Result<(), TransportError> {
        let state = self.hub.lock();
        let (name, me) = state.current_room(self.key)?;
        let Some(room) = state.rooms.get(&name) else {
            return Err(TransportError::NotInRoom);
        };
        for member in &room.members {
            let deliver = match target {
                Target::All => true,
                Target::Others => member.id != me,
                Target::Participant(id) => member.id == id,
            };
            if deliver {
                state.send(
                    member.client,
                    TransportEvent::ActionInvoked {
                        sender: me,
                        payload: payload.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    fn publish_snapshot(
        &mut self,
        entity: EntityId,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        let state = self.hub.lock();
        let (name, me) = state.current_room(self.key)?;
        if let Some(room) = state.rooms.get(&name) {
            let event = TransportEvent::SnapshotReceived {
                sender: me,
                entity,
                payload,
            };
            state.broadcast_room(room, Some(me), &event);
        }
        Ok(())
    }

    fn network_time_ms(&self) -> u64 {
        self.hub.lock().now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(hub: &LoopbackHub, name: &str) -> (LoopbackTransport, EventQueue) {
        let (mut t, mut q) = hub.endpoint();
        t.set_nickname(name);
        t.connect().unwrap();
        t.join_lobby().unwrap();
        q.drain();
        (t, q)
    }

    fn joined_id(events: &[TransportEvent]) -> ParticipantId {
        events
            .iter()
            .find_map(|e| match e {
                TransportEvent::JoinedRoom { local, .. } => Some(*local),
                _ => None,
            })
            .expect("joined room")
    }

    #[test]
    fn test_requests_before_connect_return_not_connected() {
        let hub = LoopbackHub::with_manual_clock();
        let (mut t, _q) = hub.endpoint();
        assert!(matches!(t.join_lobby(), Err(TransportError::NotConnected)));
        assert!(matches!(t.leave_room(), Err(TransportError::NotConnected)));
    }

    #[test]
    fn test_create_then_join_assigns_creator_as_master() {
        let hub = LoopbackHub::with_manual_clock();
        let (mut a, mut qa) = connected(&hub, "Ana");
        let (mut b, mut qb) = connected(&hub, "Bo");

        a.create_or_join_room("arena", RoomOptions::default()).unwrap();
        let a_id = joined_id(&qa.drain());
        b.join_room("arena").unwrap();
        let events = qb.drain();
        let b_id = joined_id(&events);

        let TransportEvent::JoinedRoom { room, .. } = &events[events.len() - 1] else {
            panic!("expected JoinedRoom last, got {events:?}");
        };
        assert_eq!(room.master, a_id);
        assert_eq!(room.participants.len(), 2);
        assert_eq!(room.participants[1].nickname, "Bo");

        let entered = qa.drain();
        assert!(entered.iter().any(|e| matches!(
            e,
            TransportEvent::ParticipantEntered(info) if info.id == b_id
        )));
    }

    #[test]
    fn test_join_full_and_closed_rooms_fail_with_reason() {
        let hub = LoopbackHub::with_manual_clock();
        let (mut a, _qa) = connected(&hub, "Ana");
        let (mut b, _qb) = connected(&hub, "Bo");
        let (mut c, mut qc) = connected(&hub, "Cy");

        a.create_or_join_room(
            "duel",
            RoomOptions {
                max_participants: 2,
                ..RoomOptions::default()
            },
        )
        .unwrap();
        b.join_room("duel").unwrap();
        c.join_room("duel").unwrap();
        assert!(qc.drain().contains(&TransportEvent::JoinFailed {
            reason: JoinFailure::Full
        }));

        b.leave_room().unwrap();
        a.set_room_open(false).unwrap();
        c.join_room("duel").unwrap();
        assert!(qc.drain().contains(&TransportEvent::JoinFailed {
            reason: JoinFailure::Closed
        }));

        c.join_room("nowhere").unwrap();
        assert!(qc.drain().contains(&TransportEvent::JoinFailed {
            reason: JoinFailure::NotFound
        }));
    }

    #[test]
    fn test_master_leaving_elects_oldest_remaining() {
        let hub = LoopbackHub::with_manual_clock();
        let (mut a, _qa) = connected(&hub, "Ana");
        let (mut b, mut qb) = connected(&hub, "Bo");
        let (mut c, mut qc) = connected(&hub, "Cy");

        a.create_or_join_room("arena", RoomOptions::default()).unwrap();
        b.join_room("arena").unwrap();
        let b_id = joined_id(&qb.drain());
        c.join_room("arena").unwrap();
        qc.drain();

        a.leave_room().unwrap();
        let events = qc.drain();
        assert!(events.contains(&TransportEvent::MasterChanged { new_master: b_id }));
    }

    #[test]
    fn test_invoke_all_includes_sender_in_send_order() {
        let hub = LoopbackHub::with_manual_clock();
        let (mut a, mut qa) = connected(&hub, "Ana");
        a.create_or_join_room("arena", RoomOptions::default()).unwrap();
        qa.drain();

        a.invoke(Target::All, vec![1]).unwrap();
        a.invoke(Target::All, vec![2]).unwrap();
        a.invoke(Target::Others, vec![3]).unwrap();

        let payloads: Vec<Vec<u8>> = qa
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                TransportEvent::ActionInvoked { payload, .. } => Some(payload),
                _ => None,
            })
            .collect();
        assert_eq!(payloads, vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_session_properties_only_writable_by_owner() {
        let hub = LoopbackHub::with_manual_clock();
        let (mut a, mut qa) = connected(&hub, "Ana");
        a.create_or_join_room("arena", RoomOptions::default()).unwrap();
        let me = joined_id(&qa.drain());

        let result = a.set_properties(PropertyScope::Session(ParticipantId(999)), Properties::new());
        assert!(matches!(result, Err(TransportError::Rejected(_))));

        let mut props = Properties::new();
        props.insert("IsReady".into(), true.into());
        a.set_properties(PropertyScope::Session(me), props.clone()).unwrap();
        assert!(qa.drain().contains(&TransportEvent::PropertiesUpdated {
            scope: PropertyScope::Session(me),
            changed: props,
        }));
    }

    #[test]
    fn test_drop_connection_notifies_peer_and_self() {
        let hub = LoopbackHub::with_manual_clock();
        let (mut a, mut qa) = connected(&hub, "Ana");
        let (mut b, mut qb) = connected(&hub, "Bo");
        a.create_or_join_room("arena", RoomOptions::default()).unwrap();
        let a_id = joined_id(&qa.drain());
        b.join_room("arena").unwrap();
        qb.drain();

        hub.drop_connection(a_id);

        assert!(matches!(
            qa.drain().last(),
            Some(TransportEvent::Disconnected { .. })
        ));
        let events = qb.drain();
        assert!(events.contains(&TransportEvent::ParticipantLeft(a_id)));
        assert!(events
            .iter()
            .any(|e| matches!(e, TransportEvent::MasterChanged { .. })));
    }

    #[test]
    fn test_manual_clock_advances_only_on_request() {
        let hub = LoopbackHub::with_manual_clock();
        let (t, _q) = hub.endpoint();
        assert_eq!(t.network_time_ms(), 0);
        hub.advance_clock(250);
        assert_eq!(t.network_time_ms(), 250);
    }
}
