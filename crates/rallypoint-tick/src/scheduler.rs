//! Fixed-timestep scheduler driving a session's tick loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the loop wakes up later than scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Fire up to `max_catchup` missed ticks back to back, then skip the rest.
    CatchUp { max_catchup: u32 },
}

/// Tick loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Tick rate in Hz, `1..=MAX_TICK_RATE_HZ`.
    pub tick_rate_hz: u32,
    /// Overrun handling.
    pub policy: TickPolicy,
    /// Fraction of the tick budget (0.0–1.0) after which a tick's own work
    /// is reported with a warning.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 50,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.8,
        }
    }
}

impl TickConfig {
    /// Highest supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// A config for `tick_rate_hz` with the remaining fields defaulted.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`TickScheduler::new`]. A session always ticks, so a rate of
    /// 0 is raised to 1.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of one tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Tick info & metrics
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Fixed delta for this tick. Timers and smoothing advance by this,
    /// never by measured wall time.
    pub dt: Duration,
    /// `true` if the loop woke up more than 10% of a tick late.
    pub overrun: bool,
    /// Ticks dropped because of the overrun.
    pub ticks_skipped: u64,
}

/// Counters kept by the scheduler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Longest time spent between `wait_for_tick` returning and
    /// `record_tick_end`.
    pub max_tick_time: Duration,
    /// Work time of the last recorded tick as a fraction of the budget.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep tick scheduler. One per session.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    next_tick: Instant,
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler; the first tick is due one tick from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        debug!(
            rate_hz = config.tick_rate_hz,
            policy = ?config.policy,
            "tick scheduler created"
        );
        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick: Instant::now() + tick_duration,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Shorthand for `TickScheduler::new(TickConfig::with_rate(hz))`.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits until the next tick is due.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let due = self.next_tick;
        let dur = self.tick_duration;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.tick_start = Some(now);

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > dur / 10;
        let behind = (late_by.as_nanos() / dur.as_nanos()) as u64;
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if behind > 0 {
                    ticks_skipped = behind;
                    warn!(
                        tick = self.tick_count,
                        skipped = behind,
                        "tick loop fell behind, skipping ahead"
                    );
                }
                now + dur
            }
            TickPolicy::CatchUp { max_catchup } => {
                let max_catchup = u64::from(max_catchup);
                if behind > max_catchup {
                    ticks_skipped = behind - max_catchup;
                    warn!(
                        tick = self.tick_count,
                        behind,
                        skipped = ticks_skipped,
                        "tick loop fell behind beyond catch-up cap"
                    );
                    now + dur
                } else {
                    due + dur
                }
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;
        trace!(tick = self.tick_count, overrun, "tick");

        TickInfo {
            tick: self.tick_count,
            dt: dur,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the current tick's work.
    ///
    /// Feeds [`TickMetrics::max_tick_time`] and the budget warning. A call
    /// without a preceding `wait_for_tick` does nothing.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();
        self.metrics.budget_utilization = utilization;
        self.metrics.max_tick_time = self.metrics.max_tick_time.max(elapsed);

        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick work approaching budget"
            );
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
