//! Timing for Rallypoint sessions.
//!
//! Everything a session does happens inside one logical tick loop. This
//! crate provides the pieces of that loop that deal with time:
//!
//! - [`TickScheduler`] — a fixed-timestep scheduler that wakes the loop at
//!   the configured rate (50 Hz by default) and hands back the fixed `dt`.
//! - [`Countdown`] — a single countdown advanced by tick deltas.
//! - [`SessionTimer`] — the match timer followed by the exit grace timer.
//! - [`Deadlines`] — deadline entries checked once per tick, used instead
//!   of suspended tasks for delayed work (debounced toggles, kill-feed
//!   line removal).
//!
//! None of these spawn tasks or register alarms. They only move when the
//! owner of the tick loop advances them, which is what keeps all session
//! state on a single thread.
//!
//! # Integration
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(TickConfig::default());
//! loop {
//!     let tick = scheduler.wait_for_tick().await;
//!     context.tick(tick.dt);
//!     scheduler.record_tick_end();
//! }
//! ```

mod deadline;
mod scheduler;
mod timer;

pub use deadline::Deadlines;
pub use scheduler::{TickConfig, TickInfo, TickMetrics, TickPolicy, TickScheduler};
pub use timer::{Countdown, SessionTimer, TimerEdge, TimerPhase};
