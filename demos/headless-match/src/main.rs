//! Two scripted participants play one short match over an in-process hub.
//!
//! Ana creates the room, Ben joins it, both ready up, and for one minute
//! they circle the arena shooting at each other. The final leaderboard is
//! printed once the match ends and both are back in the lobby.
//!
//! ```text
//! RUST_LOG=debug cargo run -p headless-match
//! ```

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rallypoint::combat::LeaderboardEntry;
use rallypoint::prelude::*;
use rallypoint::session::Settings;
use rallypoint::tick::TickScheduler;
use tokio::sync::mpsc;
use tracing::info;

const ROOM: &str = "arena";
const ARENA_RADIUS: f32 = 12.0;
/// Radians per second each bot travels around the arena.
const ORBIT_SPEED: f32 = 0.4;

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Host,
    Guest,
}

struct Bot {
    role: Role,
    session: SessionContext,
    notices: mpsc::UnboundedReceiver<Notice>,
    room_requested: bool,
    played: bool,
    angle: f32,
    scoreboard: Vec<LeaderboardEntry>,
}

impl Bot {
    fn new(
        hub: &LoopbackHub,
        name: &str,
        role: Role,
        config: ClientConfig,
    ) -> Result<Self, RallypointError> {
        let (transport, events) = hub.endpoint();
        let (sink, notices) = mpsc::unbounded_channel();
        let settings = UserSettings::load(Box::new(MemoryStore::with(Settings {
            display_name: name.into(),
            cursor_lock: false,
        })))?;

        let session = SessionContext::builder()
            .config(config)
            .transport(transport, events)
            .spawn_pool(SpawnPool::new(spawn_points())?)
            .notice_sink(sink)
            .settings(settings)
            .build()?;

        Ok(Self {
            role,
            session,
            notices,
            room_requested: false,
            played: false,
            angle: if role == Role::Host { 0.0 } else { TAU / 2.0 },
            scoreboard: Vec::new(),
        })
    }

    /// Decides what to do before the session ticks.
    fn act(&mut self, tick: u64, dt: f32, opponent: Option<(ParticipantId, Vec3)>) {
        match self.session.phase() {
            ClientPhase::InLobby if !self.played && !self.room_requested => {
                let requested = match self.role {
                    Role::Host => self.session.create_room(ROOM),
                    Role::Guest if self.session.lifecycle().directory().contains(ROOM) => {
                        self.session.join_room(ROOM)
                    }
                    Role::Guest => return,
                };
                match requested {
                    Ok(()) => self.room_requested = true,
                    Err(e) => tracing::warn!(error = %e, "room request failed"),
                }
            }
            ClientPhase::InRoom(RoomPhase::WaitingForReady)
                if !self.session.lifecycle().local_ready() =>
            {
                if let Err(e) = self.session.toggle_ready() {
                    tracing::warn!(error = %e, "ready toggle failed");
                }
            }
            ClientPhase::InMatch => {
                self.played = true;
                self.angle = (self.angle + ORBIT_SPEED * dt) % TAU;
                let position = Vec3::new(self.angle.cos(), 0.0, self.angle.sin()) * ARENA_RADIUS;
                let velocity =
                    Vec3::new(-self.angle.sin(), 0.0, self.angle.cos()) * ARENA_RADIUS * ORBIT_SPEED;
                let transform = Transform {
                    position,
                    rotation: Quat::from_rotation_y(-self.angle),
                };
                self.session.update_local_transform(transform, velocity);

                // The guest only shoots in bursts, so the host usually wins.
                let held = match self.role {
                    Role::Host => true,
                    Role::Guest => tick % 150 < 60,
                };
                let aim = opponent.map(|(target, point)| Hit {
                    point,
                    target: Some(target),
                });
                self.session.set_trigger(held && aim.is_some(), aim);
            }
            _ => {}
        }
    }

    /// Logs what happened during the tick.
    fn report(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            let me = self.session.settings().display_name().to_string();
            match notice {
                Notice::Lifecycle(LifecycleNotice::GameOver) => {
                    self.scoreboard = self.session.combat().leaderboard(self.session.roster());
                    info!(bot = %me, "game over");
                }
                Notice::Lifecycle(LifecycleNotice::JoinFailed { reason }) => {
                    tracing::warn!(bot = %me, %reason, "join failed, retrying");
                    self.room_requested = false;
                }
                Notice::Lifecycle(LifecycleNotice::CountdownTick { remaining }) => {
                    info!(bot = %me, remaining, "countdown");
                }
                Notice::Combat(CombatNotice::Logged { message }) => {
                    info!(bot = %me, "{message}");
                }
                Notice::Combat(CombatNotice::Died { victim, killer }) => {
                    let roster = self.session.roster();
                    info!(
                        bot = %me,
                        victim = %roster.nickname(victim),
                        killer = ?killer.map(|k| roster.nickname(k)),
                        "death"
                    );
                }
                other => tracing::debug!(bot = %me, notice = ?other, "notice"),
            }
        }
    }

    /// Where this bot's avatar currently is, as the others would aim at it.
    fn avatar(&self) -> Option<(ParticipantId, Vec3)> {
        let local = self.session.local_id()?;
        let transform = self.session.replicator().transform(EntityId::avatar_of(local))?;
        Some((local, transform.position + Vec3::Y))
    }

    fn finished(&self) -> bool {
        self.played && self.session.phase() == ClientPhase::InLobby
    }
}

fn spawn_points() -> Vec<Transform> {
    (0..4)
        .map(|i| {
            let angle = i as f32 * TAU / 4.0;
            Transform::from_position(Vec3::new(angle.cos(), 0.0, angle.sin()) * ARENA_RADIUS)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), RallypointError> {
    rallypoint::init_tracing();

    let mut config = ClientConfig::default();
    config.lifecycle.match_minutes = 1;

    let hub = LoopbackHub::new();
    let mut bots = vec![
        Bot::new(&hub, "Ana", Role::Host, config.clone())?,
        Bot::new(&hub, "Ben", Role::Guest, config.clone())?,
    ];
    for bot in &mut bots {
        bot.session.connect()?;
    }

    let mut scheduler = TickScheduler::new(config.tick.clone());
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    info!(rate_hz = scheduler.tick_rate_hz(), "headless match starting");

    loop {
        tokio::select! {
            _ = &mut interrupted => {
                info!("interrupted");
                break;
            }
            next = scheduler.wait_for_tick() => {
                let dt = next.dt.as_secs_f32();
                let avatars: Vec<_> = bots.iter().map(Bot::avatar).collect();
                for (i, bot) in bots.iter_mut().enumerate() {
                    bot.act(next.tick, dt, avatars[1 - i]);
                    bot.session.tick(next.dt);
                    bot.report();
                }
                scheduler.record_tick_end();

                if bots.iter().all(Bot::finished) {
                    break;
                }
            }
        }
    }

    let metrics = scheduler.metrics();
    info!(
        ticks = metrics.total_ticks,
        overruns = metrics.total_overruns,
        max_tick_us = metrics.max_tick_time.as_micros() as u64,
        "loop finished"
    );
    for entry in &bots[0].scoreboard {
        println!(
            "{:<8} {:>3} kills {:>3} deaths {:>4}",
            entry.nickname,
            entry.kills,
            entry.deaths,
            entry.score_label()
        );
    }
    Ok(())
}
