//! # Rallypoint
//!
//! Session coordination for small real-time multiplayer matches.
//!
//! Each participant runs one [`SessionContext`]. It owns everything the
//! session touches (lifecycle, roster, replicated entities, combat records)
//! and advances all of it from a single tick loop. Transport events are
//! queued and drained at tick boundaries, so nothing here needs a lock.
//!
//! ```text
//! transport events ──→ RoomLifecycle ──(phase)──→ EntityReplicator / ActionProtocol
//!                           │                              │
//!                           └──────── notices ──→ NoticeSink ←┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rallypoint::prelude::*;
//!
//! # async fn demo() -> Result<(), RallypointError> {
//! let hub = LoopbackHub::new();
//! let (transport, events) = hub.endpoint();
//! let spawns = SpawnPool::new(vec![Transform::default()])?;
//!
//! let mut session = SessionContext::builder()
//!     .transport(transport, events)
//!     .spawn_pool(spawns)
//!     .notice_sink(|notice: Notice| println!("{notice:?}"))
//!     .build()?;
//!
//! session.connect()?;
//! session.run(std::future::pending()).await;
//! # Ok(())
//! # }
//! ```

mod config;
mod context;
mod error;
mod logging;
mod notice;

pub use config::ClientConfig;
pub use context::{SessionContext, SessionContextBuilder};
pub use error::{ConfigError, RallypointError};
pub use logging::init_tracing;
pub use notice::{Notice, NoticeSink};

pub use rallypoint_combat as combat;
pub use rallypoint_protocol as protocol;
pub use rallypoint_replication as replication;
pub use rallypoint_room as room;
pub use rallypoint_session as session;
pub use rallypoint_tick as tick;
pub use rallypoint_transport as transport;

/// The types most sessions need.
pub mod prelude {
    pub use crate::{
        ClientConfig, ConfigError, Notice, NoticeSink, RallypointError, SessionContext,
        SessionContextBuilder,
    };
    pub use rallypoint_combat::{CombatConfig, CombatNotice, Hit, SpawnPool};
    pub use rallypoint_protocol::{EntityId, JoinFailure, ParticipantId};
    pub use rallypoint_replication::{ReplicationConfig, Transform};
    pub use rallypoint_room::{ClientPhase, LifecycleConfig, LifecycleNotice, RoomPhase};
    pub use rallypoint_session::{JsonFileStore, MemoryStore, UserSettings};
    pub use rallypoint_tick::TickConfig;
    #[cfg(feature = "loopback")]
    pub use rallypoint_transport::LoopbackHub;
    pub use rallypoint_transport::{EventQueue, Transport};
}
