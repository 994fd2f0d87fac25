//! Room lifecycle for Rallypoint.
//!
//! Drives one participant from connection through lobby, room, ready
//! check, countdown, match and game over, and back out again.
//!
//! # Key types
//!
//! - [`RoomLifecycle`] — the state machine; fed transport events and ticks
//! - [`ClientPhase`] / [`RoomPhase`] — where we are
//! - [`RoomDirectory`] — the lobby's room list
//! - [`LifecycleNotice`] — what happened, for the layers above
//! - [`LifecycleConfig`] — countdown, debounce, participant and match limits

mod config;
mod directory;
mod error;
mod lifecycle;
mod notice;

pub use config::{ClientPhase, LifecycleConfig, RoomPhase};
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use lifecycle::RoomLifecycle;
pub use notice::LifecycleNotice;
