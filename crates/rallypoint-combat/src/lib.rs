//! Combat for Rallypoint: damage, death, respawn and the kill feed.
//!
//! Nothing here writes combat state directly from the network. A state
//! change is broadcast as an [`Action`](rallypoint_protocol::Action) to
//! every participant, the sender included, and each of them runs the same
//! resolution against its own copy of the records:
//!
//! ```text
//! fire() ──invoke(All)──→ on_action() ─→ resolve_damage() ─(health ≤ 0)→ resolve_death()
//!                                                                          │
//!                            master only: Log "A killed B." ←──────────────┤
//!                            victim's owner only: request_respawn() ←──────┘
//! ```
//!
//! Calls are numbered per sender; a call whose number isn't above the last
//! one applied from that sender is dropped, so a duplicated delivery can't
//! apply damage twice.

mod config;
mod error;
mod feed;
mod notice;
mod protocol;
mod record;
mod spawn;
mod weapon;

pub use config::CombatConfig;
pub use error::CombatError;
pub use feed::KillFeed;
pub use notice::CombatNotice;
pub use protocol::{ActionProtocol, CombatContext, Hit};
pub use record::{CombatRecord, LeaderboardEntry, PlayerRecord};
pub use spawn::SpawnPool;
pub use weapon::Weapon;
