//! Participant bookkeeping for Rallypoint.
//!
//! This crate answers two questions for the layers above it:
//!
//! 1. **Who is in the room?** — [`Roster`] mirrors the transport's view of
//!    the current room: every [`Session`] in join order, which one is us,
//!    and which one is the master.
//! 2. **Who are we?** — [`UserSettings`] holds the persisted display name
//!    and cursor-lock preference, loaded at startup and written back
//!    through a [`SettingsStore`] on every change.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room / Combat / Replication (above)  ← read the roster, never write it
//!     ↕
//! Session Layer (this crate)  ← the roster is updated from transport events
//!     ↕
//! Transport / Protocol (below)  ← ParticipantInfo, RoomInfo, Properties
//! ```

mod error;
mod roster;
mod session;
mod settings;

pub use error::SessionError;
pub use roster::Roster;
pub use session::Session;
pub use settings::{
    JsonFileStore, MemoryStore, Settings, SettingsStore, UserSettings, DEFAULT_DISPLAY_NAME,
};
