//! Events delivered by the transport and the queue they travel through.

use std::fmt;

use rallypoint_protocol::{
    EntityId, JoinFailure, ParticipantId, Properties, PropertyScope, RoomSummary,
};
use tokio::sync::mpsc;

/// A participant as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub nickname: String,
    pub properties: Properties,
}

/// The room state handed over when we join a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub name: String,
    pub max_participants: usize,
    pub is_open: bool,
    pub master: ParticipantId,
    pub properties: Properties,
    /// Everyone in the room (us included), oldest joiner first.
    pub participants: Vec<ParticipantInfo>,
}

/// Why the connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectCause {
    /// We asked to disconnect.
    ClientRequest,
    /// The remote side stopped hearing from us.
    Timeout,
    /// Anything else the transport reports.
    Other(String),
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientRequest => write!(f, "client request"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Everything the transport can tell a session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected { cause: DisconnectCause },
    JoinedLobby,
    JoinedRoom { local: ParticipantId, room: RoomInfo },
    JoinFailed { reason: JoinFailure },
    /// Our own leave request completed.
    LeftRoom,
    ParticipantEntered(ParticipantInfo),
    ParticipantLeft(ParticipantId),
    PropertiesUpdated { scope: PropertyScope, changed: Properties },
    MasterChanged { new_master: ParticipantId },
    RoomListUpdated(Vec<RoomSummary>),
    SnapshotReceived {
        sender: ParticipantId,
        entity: EntityId,
        payload: Vec<u8>,
    },
    ActionInvoked { sender: ParticipantId, payload: Vec<u8> },
}

/// Creates a connected sender/queue pair.
///
/// The transport keeps the [`EventSender`]; the session keeps the
/// [`EventQueue`] and drains it once per tick.
pub fn event_queue() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventQueue { rx })
}

/// Producer half of the event queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSender {
    /// Queues an event. Silently dropped if the session is gone.
    pub fn push(&self, event: TransportEvent) {
        let _ = self.tx.send(event);
    }
}

/// Consumer half of the event queue.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

impl EventQueue {
    /// Takes every event queued so far, in arrival order, without waiting.
    pub fn drain(&mut self) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
