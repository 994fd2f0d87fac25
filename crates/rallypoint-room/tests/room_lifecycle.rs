//! Integration tests for the room lifecycle over the in-memory transport.

use std::time::Duration;

use rallypoint_protocol::{JoinFailure, ParticipantId};
use rallypoint_room::{
    ClientPhase, LifecycleConfig, LifecycleNotice, RoomError, RoomLifecycle, RoomPhase,
};
use rallypoint_transport::{EventQueue, LoopbackHub, LoopbackTransport};

// =========================================================================
// Harness: one participant = lifecycle + loopback endpoint
// =========================================================================

const TICK: Duration = Duration::from_millis(20);

struct Client {
    lifecycle: RoomLifecycle,
    transport: LoopbackTransport,
    queue: EventQueue,
    notices: Vec<LifecycleNotice>,
}

impl Client {
    fn connect(hub: &LoopbackHub, name: &str) -> Self {
        let (transport, queue) = hub.endpoint();
        let mut client = Self {
            lifecycle: RoomLifecycle::new(LifecycleConfig::default()),
            transport,
            queue,
            notices: Vec::new(),
        };
        client
            .lifecycle
            .connect(&mut client.transport, name)
            .unwrap();
        client.pump();
        assert_eq!(client.lifecycle.phase(), ClientPhase::InLobby);
        client
    }

    /// Handles queued events until none are left, including events
    /// caused by handling earlier ones.
    fn pump(&mut self) {
        loop {
            let events = self.queue.drain();
            if events.is_empty() {
                break;
            }
            for event in &events {
                self.lifecycle
                    .handle_event(&mut self.transport, event)
                    .unwrap();
            }
        }
        self.notices.extend(self.lifecycle.drain_notices());
    }

    fn tick(&mut self) {
        self.pump();
        self.lifecycle.tick(&mut self.transport, TICK).unwrap();
        self.notices.extend(self.lifecycle.drain_notices());
    }

    fn id(&self) -> ParticipantId {
        self.lifecycle.roster().local().unwrap()
    }

    fn count(&self, notice: &LifecycleNotice) -> usize {
        self.notices.iter().filter(|n| *n == notice).count()
    }
}

fn room_of(hub: &LoopbackHub, names: &[&str]) -> Vec<Client> {
    let mut clients: Vec<Client> = names.iter().map(|n| Client::connect(hub, n)).collect();
    let (first, rest) = clients.split_first_mut().unwrap();
    first
        .lifecycle
        .create_room(&mut first.transport, "arena")
        .unwrap();
    first.pump();
    for client in rest {
        client.pump();
        client
            .lifecycle
            .join_room(&mut client.transport, "arena")
            .unwrap();
        client.pump();
    }
    for client in &mut clients {
        client.pump();
        assert_eq!(
            client.lifecycle.phase(),
            ClientPhase::InRoom(RoomPhase::WaitingForReady)
        );
    }
    clients
}

// =========================================================================
// End to end
// =========================================================================

#[test]
fn test_two_ready_participants_enter_match_on_same_tick() {
    let hub = LoopbackHub::with_manual_clock();
    let mut clients = room_of(&hub, &["Ana", "Bo"]);

    let c = &mut clients[0];
    c.lifecycle.toggle_ready(&mut c.transport).unwrap();
    // Bo readies a few ticks later, well within a second.
    for _ in 0..10 {
        for c in clients.iter_mut() {
            c.tick();
        }
    }
    let c = &mut clients[1];
    c.lifecycle.toggle_ready(&mut c.transport).unwrap();

    let mut entered = [None, None];
    for tick in 0..400u32 {
        for (i, c) in clients.iter_mut().enumerate() {
            c.tick();
            if entered[i].is_none() && c.lifecycle.phase() == ClientPhase::InMatch {
                entered[i] = Some(tick);
            }
        }
    }

    let (a, b) = (entered[0].unwrap(), entered[1].unwrap());
    assert!(a.abs_diff(b) <= 1, "entered InMatch at ticks {a} and {b}");
    assert!(!hub.rooms()[0].is_open, "master closes the room");
    assert_eq!(
        clients[0].lifecycle.timer().match_clock(),
        clients[1].lifecycle.timer().match_clock()
    );
}

#[test]
fn test_master_disconnect_remaining_each_leave_once() {
    let hub = LoopbackHub::with_manual_clock();
    let mut clients = room_of(&hub, &["Ana", "Bo", "Cy"]);
    let master = clients[0].id();
    assert_eq!(clients[1].lifecycle.roster().master(), Some(master));

    hub.drop_connection(master);
    for _ in 0..3 {
        for c in clients[1..].iter_mut() {
            c.tick();
        }
    }

    for c in &clients[1..] {
        assert_eq!(c.count(&LifecycleNotice::LeaveRequested), 1);
        assert_eq!(c.lifecycle.phase(), ClientPhase::InLobby);
    }
    assert!(hub.rooms().is_empty());

    clients[0].pump();
    assert_eq!(clients[0].lifecycle.phase(), ClientPhase::Disconnected);
}

#[test]
fn test_join_started_match_rejected_as_closed() {
    let hub = LoopbackHub::with_manual_clock();
    let mut clients = room_of(&hub, &["Ana", "Bo"]);
    let mut late = Client::connect(&hub, "Cy");

    for c in clients.iter_mut() {
        c.lifecycle.toggle_ready(&mut c.transport).unwrap();
    }
    for _ in 0..200 {
        for c in clients.iter_mut() {
            c.tick();
        }
    }
    assert_eq!(clients[0].lifecycle.phase(), ClientPhase::InMatch);

    late.pump();
    let listed = late.lifecycle.directory().get("arena").unwrap();
    assert!(!listed.is_open);
    assert!(matches!(
        late.lifecycle.join_room(&mut late.transport, "arena"),
        Err(RoomError::JoinRejected(JoinFailure::Closed))
    ));
    assert_eq!(late.lifecycle.phase(), ClientPhase::InLobby);
}

#[test]
fn test_lobby_directory_tracks_room_ratio() {
    let hub = LoopbackHub::with_manual_clock();
    let mut watcher = Client::connect(&hub, "Watcher");
    let _clients = room_of(&hub, &["Ana", "Bo"]);

    watcher.pump();
    assert_eq!(watcher.lifecycle.directory().len(), 1);
    assert_eq!(
        watcher.lifecycle.directory().get("arena").unwrap().player_ratio(),
        "2 / 4"
    );

    watcher.lifecycle.refresh_rooms(&mut watcher.transport).unwrap();
    watcher.pump();
    assert_eq!(watcher.lifecycle.directory().len(), 1);
}

#[test]
fn test_create_existing_room_name_rejected_as_collision() {
    let hub = LoopbackHub::with_manual_clock();
    let _clients = room_of(&hub, &["Ana"]);
    let mut other = Client::connect(&hub, "Bo");

    assert!(matches!(
        other.lifecycle.create_room(&mut other.transport, "arena"),
        Err(RoomError::JoinRejected(JoinFailure::NameCollision))
    ));
    assert_eq!(other.lifecycle.phase(), ClientPhase::InLobby);
}
