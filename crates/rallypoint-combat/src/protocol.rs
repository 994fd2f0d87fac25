//! Broadcast-executed combat actions.

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec3;
use rallypoint_protocol::{Action, ActionCall, Codec, EntityId, JsonCodec, ParticipantId, Target};
use rallypoint_replication::{EntityReplicator, Transform};
use rallypoint_session::Roster;
use rallypoint_transport::{Transport, TransportError};
use tracing::{debug, info, trace, warn};

use crate::{
    CombatConfig, CombatError, CombatNotice, CombatRecord, KillFeed, LeaderboardEntry, PlayerRecord,
    SpawnPool, Weapon,
};

/// What a locally predicted shot struck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    /// The participant whose avatar was hit, if it was one.
    pub target: Option<ParticipantId>,
}

/// The session state combat reads or drives, borrowed for one call.
///
/// The roster is read only; combat never changes membership.
pub struct CombatContext<'a> {
    pub transport: &'a mut dyn Transport,
    pub roster: &'a Roster,
    pub replicator: &'a mut EntityReplicator,
}

/// Combat state of every participant, kept identically on each of them.
///
/// Every state change enters through [`on_action`](Self::on_action): the
/// local participant's own shots included, since they are broadcast to
/// `All`. The `resolve_*` operations depend only on their arguments and
/// this participant's own records, so all participants that apply the same
/// calls in the same per-sender order end up with the same records.
pub struct ActionProtocol<C: Codec = JsonCodec> {
    config: CombatConfig,
    codec: C,
    spawns: SpawnPool,
    weapon: Weapon,
    next_seq: u64,
    last_applied: BTreeMap<ParticipantId, u64>,
    combat: BTreeMap<ParticipantId, CombatRecord>,
    players: BTreeMap<ParticipantId, PlayerRecord>,
    feed: KillFeed,
    notices: Vec<CombatNotice>,
}

impl ActionProtocol<JsonCodec> {
    pub fn new(config: CombatConfig, spawns: SpawnPool) -> Self {
        Self::with_codec(config, spawns, JsonCodec)
    }
}

impl<C: Codec> ActionProtocol<C> {
    pub fn with_codec(config: CombatConfig, spawns: SpawnPool, codec: C) -> Self {
        let config = config.validated();
        Self {
            weapon: Weapon::new(config.fire_interval()),
            feed: KillFeed::new(config.log_duration, config.visible_log_lines),
            config,
            codec,
            spawns,
            next_seq: 0,
            last_applied: BTreeMap::new(),
            combat: BTreeMap::new(),
            players: BTreeMap::new(),
            notices: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn combat_record(&self, participant: ParticipantId) -> Option<&CombatRecord> {
        self.combat.get(&participant)
    }

    pub fn player_record(&self, participant: ParticipantId) -> Option<&PlayerRecord> {
        self.players.get(&participant)
    }

    pub fn feed(&self) -> &KillFeed {
        &self.feed
    }

    /// Score table of everyone in the roster, best score first.
    ///
    /// Ties go to more kills, then to the earlier joiner.
    pub fn leaderboard(&self, roster: &Roster) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<_> = roster
            .iter()
            .enumerate()
            .map(|(order, session)| {
                let id = session.participant_id;
                let record = self.players.get(&id).copied().unwrap_or_default();
                let entry = LeaderboardEntry {
                    participant: id,
                    nickname: session.nickname.clone(),
                    kills: record.kills(),
                    deaths: record.deaths(),
                    score: record.score(),
                    is_local: roster.local() == Some(id),
                };
                (order, entry)
            })
            .collect();
        entries.sort_by(|(oa, a), (ob, b)| {
            b.score
                .cmp(&a.score)
                .then(b.kills.cmp(&a.kills))
                .then(oa.cmp(ob))
        });
        entries.into_iter().map(|(_, e)| e).collect()
    }

    /// Takes the notices collected since the last call.
    pub fn drain_notices(&mut self) -> Vec<CombatNotice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // Match setup
    // -----------------------------------------------------------------------

    /// Records for everyone, our avatar at a random spawn point and a
    /// replica for everybody else's. The master announces each spawn.
    ///
    /// Records that calls already touched are kept: a peer that entered the
    /// match a tick earlier may have shot before we got here. Records only
    /// start over in [`reset`](Self::reset).
    pub fn begin_match(&mut self, ctx: &mut CombatContext<'_>) -> Result<(), CombatError> {
        self.weapon = Weapon::new(self.config.fire_interval());
        ctx.replicator.clear();

        let roster = ctx.roster;
        let local = roster.local();
        let max_health = self.config.max_health;
        for session in roster.iter() {
            let id = session.participant_id;
            self.combat
                .entry(id)
                .or_insert_with(|| CombatRecord::new(max_health));
            self.players.entry(id).or_default();
            let avatar = EntityId::avatar_of(id);
            if Some(id) == local {
                let at = self.spawns.pick();
                ctx.replicator.spawn_owned(avatar, id, at);
                self.notices.push(CombatNotice::Respawned { participant: id, at });
            } else {
                ctx.replicator.spawn_replica(avatar, id, Transform::default());
            }
        }
        info!(participants = roster.len(), "combat started");

        if roster.is_local_master() {
            for session in roster.iter() {
                let line = format!("{} spawned.", session.nickname);
                self.broadcast_log(ctx, line)?;
            }
        }
        Ok(())
    }

    /// Forgets a departed participant. The master announces the departure.
    pub fn participant_left(
        &mut self,
        ctx: &mut CombatContext<'_>,
        participant: ParticipantId,
        nickname: &str,
    ) -> Result<(), CombatError> {
        self.combat.remove(&participant);
        self.players.remove(&participant);
        self.last_applied.remove(&participant);
        ctx.replicator.despawn(EntityId::avatar_of(participant));
        if ctx.roster.is_local_master() {
            self.broadcast_log(ctx, format!("{nickname} left."))?;
        }
        Ok(())
    }

    /// Drops all combat state, e.g. after leaving the room.
    pub fn reset(&mut self) {
        self.next_seq = 0;
        self.last_applied.clear();
        self.combat.clear();
        self.players.clear();
        self.feed.clear();
        self.weapon = Weapon::new(self.config.fire_interval());
    }

    /// Advances the kill feed's removal deadlines.
    pub fn tick(&mut self, dt: Duration) {
        if self.feed.tick(dt) {
            trace!(lines = self.feed.len(), "kill feed trimmed");
        }
    }

    // -----------------------------------------------------------------------
    // Local requests
    // -----------------------------------------------------------------------

    /// Feeds the trigger state into the fire-rate gate; fires if it opens.
    ///
    /// `aim` runs only when a shot actually goes off and returns what the
    /// local hit check struck.
    pub fn trigger(
        &mut self,
        ctx: &mut CombatContext<'_>,
        held: bool,
        dt: Duration,
        aim: impl FnOnce() -> Option<Hit>,
    ) -> Result<bool, CombatError> {
        if !self.weapon.trigger(held, dt) {
            return Ok(false);
        }
        self.fire(ctx, aim())?;
        Ok(true)
    }

    /// Broadcasts one shot: the cosmetic effect, and damage if a
    /// participant was hit.
    pub fn fire(&mut self, ctx: &mut CombatContext<'_>, hit: Option<Hit>) -> Result<(), CombatError> {
        let shooter = ctx.roster.local().ok_or(TransportError::NotInRoom)?;
        self.send(
            ctx.transport,
            shooter,
            Action::FireEffect {
                shooter,
                hit_point: hit.map(|h| h.point),
            },
        )?;
        if let Some(target) = hit.and_then(|h| h.target) {
            debug!(%shooter, %target, "hit");
            self.send(
                ctx.transport,
                shooter,
                Action::Damage {
                    target,
                    amount: self.config.weapon_damage,
                    attacker: shooter,
                },
            )?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Incoming calls
    // -----------------------------------------------------------------------

    /// Applies an action call delivered by the transport.
    ///
    /// Calls claiming another sender, and calls not numbered above the last
    /// one applied from their sender, are dropped without error.
    pub fn on_action(
        &mut self,
        ctx: &mut CombatContext<'_>,
        sender: ParticipantId,
        payload: &[u8],
    ) -> Result<(), CombatError> {
        let call: ActionCall = self.codec.decode(payload)?;
        if call.sender != sender {
            warn!(%sender, claimed = %call.sender, "action call with forged sender dropped");
            return Ok(());
        }
        let last = self.last_applied.get(&sender).copied().unwrap_or(0);
        if call.seq <= last {
            debug!(%sender, seq = call.seq, last, "duplicate or late action call dropped");
            return Ok(());
        }
        self.last_applied.insert(sender, call.seq);
        trace!(%sender, seq = call.seq, action = ?call.action, "action call");

        match call.action {
            Action::Damage {
                target,
                amount,
                attacker,
            } => self.resolve_damage(ctx, target, amount, attacker),
            Action::FireEffect { shooter, hit_point } => {
                self.notices.push(CombatNotice::FireEffect { shooter, hit_point });
                Ok(())
            }
            Action::Log { message } => {
                self.feed.push(message.clone());
                self.notices.push(CombatNotice::Logged { message });
                Ok(())
            }
        }
    }

    /// Subtracts `amount` from `target`'s health and credits `attacker`;
    /// resolves the death if health drops to zero or below.
    pub fn resolve_damage(
        &mut self,
        ctx: &mut CombatContext<'_>,
        target: ParticipantId,
        amount: i32,
        attacker: ParticipantId,
    ) -> Result<(), CombatError> {
        let record = self.record_mut(ctx.roster, target)?;
        record.health -= amount;
        if record.last_attacker != Some(attacker) {
            record.last_attacker = Some(attacker);
        }
        let health = record.health;
        let dead = record.is_dead();
        debug!(%target, %attacker, amount, health, "damage");
        self.notices.push(CombatNotice::Damaged {
            target,
            attacker,
            health,
        });

        if dead {
            self.resolve_death(ctx, target)?;
        }
        Ok(())
    }

    /// Restores `target`, scores the kill for its last attacker and the
    /// death for `target`. The master writes the kill-feed line; the
    /// victim's own participant moves its avatar to a spawn point.
    pub fn resolve_death(
        &mut self,
        ctx: &mut CombatContext<'_>,
        target: ParticipantId,
    ) -> Result<(), CombatError> {
        let max_health = self.config.max_health;
        let record = self.record_mut(ctx.roster, target)?;
        record.health = max_health;
        let killer = record.last_attacker;

        match killer.filter(|k| ctx.roster.contains(*k)) {
            Some(k) => self.players.entry(k).or_default().add_kill(),
            None => warn!(%target, ?killer, "death without a known attacker"),
        }
        self.players.entry(target).or_default().add_death();
        info!(victim = %target, ?killer, "player died");
        self.notices.push(CombatNotice::Died {
            victim: target,
            killer,
        });

        if let Some(killer) = killer {
            if ctx.roster.is_local_master() {
                let line = format!(
                    "{} killed {}.",
                    ctx.roster.nickname(killer),
                    ctx.roster.nickname(target)
                );
                self.broadcast_log(ctx, line)?;
            }
        }
        if ctx.roster.local() == Some(target) {
            self.request_respawn(ctx, target);
        }
        Ok(())
    }

    /// Moves `target`'s avatar to a random spawn point, if we own it.
    ///
    /// Returns whether a relocation happened.
    pub fn request_respawn(&mut self, ctx: &mut CombatContext<'_>, target: ParticipantId) -> bool {
        let avatar = EntityId::avatar_of(target);
        if !ctx.replicator.is_owned(avatar) {
            return false;
        }
        let at = self.spawns.pick();
        ctx.replicator.relocate(avatar, at);
        debug!(participant = %target, position = ?at.position, "respawned");
        self.notices.push(CombatNotice::Respawned {
            participant: target,
            at,
        });
        true
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn record_mut(
        &mut self,
        roster: &Roster,
        participant: ParticipantId,
    ) -> Result<&mut CombatRecord, CombatError> {
        if !self.combat.contains_key(&participant) {
            if !roster.contains(participant) {
                return Err(CombatError::UnknownParticipant(participant));
            }
            self.combat
                .insert(participant, CombatRecord::new(self.config.max_health));
            self.players.entry(participant).or_default();
        }
        self.combat
            .get_mut(&participant)
            .ok_or(CombatError::UnknownParticipant(participant))
    }

    fn broadcast_log(&mut self, ctx: &mut CombatContext<'_>, message: String) -> Result<(), CombatError> {
        let sender = ctx.roster.local().ok_or(TransportError::NotInRoom)?;
        self.send(ctx.transport, sender, Action::Log { message })
    }

    fn send(
        &mut self,
        transport: &mut dyn Transport,
        sender: ParticipantId,
        action: Action,
    ) -> Result<(), CombatError> {
        self.next_seq += 1;
        let call = ActionCall {
            sender,
            seq: self.next_seq,
            action,
        };
        let payload = self.codec.encode(&call)?;
        transport.invoke(Target::All, payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rallypoint_protocol::{EntityId, Properties, PropertyScope, RoomOptions};
    use rallypoint_replication::ReplicationConfig;
    use rallypoint_transport::{ParticipantInfo, RoomInfo};

    use super::*;

    const ANA: ParticipantId = ParticipantId(1);
    const BEN: ParticipantId = ParticipantId(2);
    const CAT: ParticipantId = ParticipantId(3);

    /// Records invoked payloads instead of sending them.
    #[derive(Default)]
    struct Recorder {
        invoked: Vec<Vec<u8>>,
    }

    impl Transport for Recorder {
        fn set_nickname(&mut self, _: &str) {}
        fn connect(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn join_lobby(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn create_or_join_room(&mut self, _: &str, _: RoomOptions) -> Result<(), TransportError> {
            Ok(())
        }
        fn join_room(&mut self, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
        fn leave_room(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn list_rooms(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn set_properties(&mut self, _: PropertyScope, _: Properties) -> Result<(), TransportError> {
            Ok(())
        }
        fn set_room_open(&mut self, _: bool) -> Result<(), TransportError> {
            Ok(())
        }
        fn invoke(&mut self, _: Target, payload: Vec<u8>) -> Result<(), TransportError> {
            self.invoked.push(payload);
            Ok(())
        }
        fn publish_snapshot(&mut self, _: EntityId, _: Vec<u8>) -> Result<(), TransportError> {
            Ok(())
        }
        fn network_time_ms(&self) -> u64 {
            0
        }
    }

    impl Recorder {
        fn actions(&self) -> Vec<Action> {
            self.invoked
                .iter()
                .map(|p| serde_json::from_slice::<ActionCall>(p).unwrap().action)
                .collect()
        }
    }

    fn roster(local: ParticipantId) -> Roster {
        let participants = [(ANA, "Ana"), (BEN, "Ben"), (CAT, "Cat")]
            .into_iter()
            .map(|(id, nickname)| ParticipantInfo {
                id,
                nickname: nickname.into(),
                properties: Properties::new(),
            })
            .collect();
        let mut roster = Roster::new();
        roster.reset_from_room(
            local,
            &RoomInfo {
                name: "arena".into(),
                max_participants: 4,
                is_open: true,
                master: ANA,
                properties: Properties::new(),
                participants,
            },
        );
        roster
    }

    fn protocol() -> ActionProtocol {
        let pool = SpawnPool::seeded(vec![Transform::from_position(Vec3::splat(9.0))], 1).unwrap();
        ActionProtocol::new(CombatConfig::default(), pool)
    }

    fn call(sender: ParticipantId, seq: u64, action: Action) -> Vec<u8> {
        serde_json::to_vec(&ActionCall { sender, seq, action }).unwrap()
    }

    fn damage(target: ParticipantId, amount: i32, attacker: ParticipantId) -> Action {
        Action::Damage {
            target,
            amount,
            attacker,
        }
    }

    #[test]
    fn test_resolve_damage_lethal_hit_credits_last_attacker() {
        let roster = roster(ANA);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        combat.resolve_damage(&mut ctx, CAT, 30, ANA).unwrap();
        let record = *combat.combat_record(CAT).unwrap();
        assert_eq!((record.health, record.last_attacker), (70, Some(ANA)));

        combat.resolve_damage(&mut ctx, CAT, 80, BEN).unwrap();
        let record = *combat.combat_record(CAT).unwrap();
        assert_eq!((record.health, record.last_attacker), (100, Some(BEN)));

        let deaths = combat
            .drain_notices()
            .into_iter()
            .filter(|n| matches!(n, CombatNotice::Died { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(combat.player_record(BEN).map(|r| r.kills()), Some(1));
        assert_eq!(combat.player_record(ANA).map_or(0, |r| r.kills()), 0);
        assert_eq!(combat.player_record(CAT).map(|r| r.deaths()), Some(1));
        assert_eq!(combat.player_record(CAT).map(|r| r.score()), Some(-1));
    }

    #[test]
    fn test_resolve_death_only_master_logs() {
        for (local, expected_logs) in [(ANA, 1), (BEN, 0)] {
            let roster = roster(local);
            let mut transport = Recorder::default();
            let mut replicator = EntityReplicator::new(ReplicationConfig::default());
            let mut ctx = CombatContext {
                transport: &mut transport,
                roster: &roster,
                replicator: &mut replicator,
            };
            let mut combat = protocol();
            combat.resolve_damage(&mut ctx, CAT, 100, BEN).unwrap();
            drop(ctx);

            let logs: Vec<_> = transport
                .actions()
                .into_iter()
                .filter_map(|a| match a {
                    Action::Log { message } => Some(message),
                    _ => None,
                })
                .collect();
            assert_eq!(logs.len(), expected_logs);
            if expected_logs == 1 {
                assert_eq!(logs[0], "Ben killed Cat.");
            }
        }
    }

    #[test]
    fn test_resolve_death_victim_owner_respawns() {
        let roster = roster(CAT);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        replicator.spawn_owned(EntityId::avatar_of(CAT), CAT, Transform::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        combat.resolve_damage(&mut ctx, CAT, 150, ANA).unwrap();
        drop(ctx);

        let avatar = EntityId::avatar_of(CAT);
        assert_eq!(replicator.epoch(avatar), Some(1));
        assert_eq!(replicator.transform(avatar).unwrap().position, Vec3::splat(9.0));
    }

    #[test]
    fn test_on_action_duplicate_seq_applied_once() {
        let roster = roster(ANA);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();
        let hit = call(BEN, 1, damage(CAT, 10, BEN));

        combat.on_action(&mut ctx, BEN, &hit).unwrap();
        combat.on_action(&mut ctx, BEN, &hit).unwrap();
        // Older than what was applied: dropped too.
        combat
            .on_action(&mut ctx, BEN, &call(BEN, 3, damage(CAT, 10, BEN)))
            .unwrap();
        combat
            .on_action(&mut ctx, BEN, &call(BEN, 2, damage(CAT, 10, BEN)))
            .unwrap();

        assert_eq!(combat.combat_record(CAT).map(|r| r.health), Some(80));
    }

    #[test]
    fn test_on_action_forged_sender_dropped() {
        let roster = roster(ANA);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        combat
            .on_action(&mut ctx, CAT, &call(BEN, 1, damage(ANA, 50, BEN)))
            .unwrap();

        assert!(combat.combat_record(ANA).is_none());
    }

    #[test]
    fn test_on_action_unknown_target_is_error() {
        let roster = roster(ANA);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        let result = combat.on_action(&mut ctx, BEN, &call(BEN, 1, damage(ParticipantId(99), 5, BEN)));
        assert!(matches!(result, Err(CombatError::UnknownParticipant(ParticipantId(99)))));
    }

    #[test]
    fn test_on_action_log_feeds_kill_feed() {
        let roster = roster(BEN);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        let log = Action::Log {
            message: "Ana spawned.".into(),
        };
        combat.on_action(&mut ctx, ANA, &call(ANA, 1, log)).unwrap();

        assert_eq!(combat.feed().text(), "Ana spawned.");
        combat.tick(Duration::from_secs(3));
        assert!(combat.feed().is_empty());
    }

    #[test]
    fn test_fire_with_hit_sends_effect_then_damage() {
        let roster = roster(BEN);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();
        let hit = Hit {
            point: Vec3::new(1.0, 2.0, 3.0),
            target: Some(CAT),
        };

        assert!(combat
            .trigger(&mut ctx, true, Duration::from_millis(20), || Some(hit))
            .unwrap());
        assert!(!combat
            .trigger(&mut ctx, true, Duration::from_millis(20), || Some(hit))
            .unwrap());
        drop(ctx);

        assert_eq!(
            transport.actions(),
            vec![
                Action::FireEffect {
                    shooter: BEN,
                    hit_point: Some(hit.point),
                },
                damage(CAT, 10, BEN),
            ]
        );
    }

    #[test]
    fn test_begin_match_spawns_avatars_and_master_announces() {
        let roster = roster(ANA);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        combat.begin_match(&mut ctx).unwrap();
        drop(ctx);

        assert!(replicator.is_owned(EntityId::avatar_of(ANA)));
        assert!(replicator.is_replica(EntityId::avatar_of(BEN)));
        assert!(replicator.is_replica(EntityId::avatar_of(CAT)));
        assert_eq!(
            transport.actions(),
            ["Ana", "Ben", "Cat"]
                .map(|n| Action::Log {
                    message: format!("{n} spawned."),
                })
                .to_vec()
        );
    }

    #[test]
    fn test_begin_match_keeps_damage_applied_before_it() {
        let roster = roster(BEN);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        combat
            .on_action(&mut ctx, ANA, &call(ANA, 1, damage(BEN, 10, ANA)))
            .unwrap();
        combat.begin_match(&mut ctx).unwrap();

        let record = *combat.combat_record(BEN).unwrap();
        assert_eq!((record.health, record.last_attacker), (90, Some(ANA)));
        assert_eq!(combat.combat_record(CAT).map(|r| r.health), Some(100));
        combat.reset();
        assert!(combat.combat_record(BEN).is_none());
    }

    #[test]
    fn test_leaderboard_sorted_by_score_then_kills() {
        let roster = roster(BEN);
        let mut transport = Recorder::default();
        let mut replicator = EntityReplicator::new(ReplicationConfig::default());
        let mut ctx = CombatContext {
            transport: &mut transport,
            roster: &roster,
            replicator: &mut replicator,
        };
        let mut combat = protocol();

        combat.resolve_damage(&mut ctx, ANA, 100, CAT).unwrap();
        combat.resolve_damage(&mut ctx, BEN, 100, CAT).unwrap();
        combat.resolve_damage(&mut ctx, CAT, 100, BEN).unwrap();

        let board = combat.leaderboard(&roster);
        let rows: Vec<_> = board
            .iter()
            .map(|e| (e.nickname.as_str(), e.score, e.is_local))
            .collect();
        assert_eq!(rows, [("Cat", 1, false), ("Ben", 0, true), ("Ana", -1, false)]);
    }
}
