//! The roster: who is in the current room.
//!
//! The roster is a mirror of the transport's room state, updated only from
//! transport events by the room lifecycle. Combat and replication read it
//! (nicknames for log lines, ownership checks) but never change it.
//!
//! Order matters: sessions are kept oldest joiner first, which is also the
//! order the transport uses to pick a new master.

use rallypoint_protocol::{ParticipantId, Properties};
use rallypoint_transport::{ParticipantInfo, RoomInfo};

use crate::{Session, SessionError};

/// Sessions of the current room in join order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    local: Option<ParticipantId>,
    master: Option<ParticipantId>,
    sessions: Vec<Session>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster with the state handed over on joining a room.
    pub fn reset_from_room(&mut self, local: ParticipantId, room: &RoomInfo) {
        self.local = Some(local);
        self.master = Some(room.master);
        self.sessions = room
            .participants
            .iter()
            .cloned()
            .map(Session::from)
            .collect();
        tracing::debug!(
            room = %room.name,
            %local,
            master = %room.master,
            count = self.sessions.len(),
            "roster reset"
        );
    }

    /// Forgets everything. Called when we leave the room or disconnect.
    pub fn clear(&mut self) {
        self.local = None;
        self.master = None;
        self.sessions.clear();
    }

    /// Adds a newly entered participant at the end of the join order.
    ///
    /// Entering twice replaces the stored session in place instead of
    /// duplicating it.
    pub fn insert(&mut self, info: ParticipantInfo) {
        let session = Session::from(info);
        match self
            .sessions
            .iter_mut()
            .find(|s| s.participant_id == session.participant_id)
        {
            Some(existing) => *existing = session,
            None => self.sessions.push(session),
        }
    }

    /// Removes a participant that left.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the participant isn't here.
    pub fn remove(&mut self, id: ParticipantId) -> Result<Session, SessionError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.participant_id == id)
            .ok_or(SessionError::NotFound(id))?;
        Ok(self.sessions.remove(index))
    }

    /// Merges changed session properties reported by the transport.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the participant isn't here.
    pub fn apply_properties(
        &mut self,
        id: ParticipantId,
        changed: &Properties,
    ) -> Result<(), SessionError> {
        self.sessions
            .iter_mut()
            .find(|s| s.participant_id == id)
            .ok_or(SessionError::NotFound(id))?
            .apply(changed);
        Ok(())
    }

    /// Records the transport's choice of master.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the new master isn't here.
    pub fn set_master(&mut self, id: ParticipantId) -> Result<(), SessionError> {
        if !self.contains(id) {
            return Err(SessionError::NotFound(id));
        }
        self.master = Some(id);
        Ok(())
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.participant_id == id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.get(id).is_some()
    }

    /// Nickname of `id`, or its id rendered as text if unknown.
    pub fn nickname(&self, id: ParticipantId) -> String {
        self.get(id)
            .map(|s| s.nickname.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Our own participant id while in a room.
    pub fn local(&self) -> Option<ParticipantId> {
        self.local
    }

    pub fn master(&self) -> Option<ParticipantId> {
        self.master
    }

    /// `true` if we are the room's master.
    pub fn is_local_master(&self) -> bool {
        self.local.is_some() && self.local == self.master
    }

    /// Ready consensus: at least two participants and every one of them
    /// ready.
    pub fn ready_consensus(&self) -> bool {
        self.sessions.len() >= 2 && self.sessions.iter().all(Session::is_ready)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions, oldest joiner first.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use rallypoint_protocol::READY_KEY;

    use super::*;

    fn pid(id: u32) -> ParticipantId {
        ParticipantId(id)
    }

    fn info(id: u32, name: &str) -> ParticipantInfo {
        ParticipantInfo {
            id: pid(id),
            nickname: name.into(),
            properties: Properties::new(),
        }
    }

    fn ready(value: bool) -> Properties {
        let mut props = Properties::new();
        props.insert(READY_KEY.into(), value.into());
        props
    }

    fn roster_of(names: &[&str]) -> Roster {
        let room = RoomInfo {
            name: "arena".into(),
            max_participants: 4,
            is_open: true,
            master: pid(1),
            properties: Properties::new(),
            participants: names
                .iter()
                .enumerate()
                .map(|(i, n)| info(i as u32 + 1, n))
                .collect(),
        };
        let mut roster = Roster::new();
        roster.reset_from_room(pid(1), &room);
        roster
    }

    #[test]
    fn test_reset_from_room_keeps_join_order_and_master() {
        let roster = roster_of(&["Ana", "Bo", "Cy"]);
        let names: Vec<_> = roster.iter().map(|s| s.nickname.as_str()).collect();
        assert_eq!(names, ["Ana", "Bo", "Cy"]);
        assert!(roster.is_local_master());
    }

    #[test]
    fn test_insert_twice_does_not_duplicate() {
        let mut roster = roster_of(&["Ana"]);
        roster.insert(info(2, "Bo"));
        roster.insert(info(2, "Bo"));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_remove_unknown_returns_not_found() {
        let mut roster = roster_of(&["Ana"]);
        assert!(matches!(
            roster.remove(pid(9)),
            Err(SessionError::NotFound(id)) if id == pid(9)
        ));
    }

    #[test]
    fn test_ready_consensus_single_participant_is_false() {
        let mut roster = roster_of(&["Ana"]);
        roster.apply_properties(pid(1), &ready(true)).unwrap();
        assert!(!roster.ready_consensus());
    }

    #[test]
    fn test_ready_consensus_requires_everyone() {
        let mut roster = roster_of(&["Ana", "Bo"]);
        roster.apply_properties(pid(1), &ready(true)).unwrap();
        assert!(!roster.ready_consensus());

        roster.apply_properties(pid(2), &ready(true)).unwrap();
        assert!(roster.ready_consensus());

        roster.insert(info(3, "Cy"));
        assert!(!roster.ready_consensus());
    }

    #[test]
    fn test_set_master_moves_authority() {
        let mut roster = roster_of(&["Ana", "Bo"]);
        roster.set_master(pid(2)).unwrap();
        assert!(!roster.is_local_master());
        assert!(roster.set_master(pid(7)).is_err());
        assert_eq!(roster.master(), Some(pid(2)));
    }

    #[test]
    fn test_nickname_unknown_falls_back_to_id() {
        let roster = roster_of(&["Ana"]);
        assert_eq!(roster.nickname(pid(1)), "Ana");
        assert_eq!(roster.nickname(pid(5)), "P-5");
    }

    #[test]
    fn test_clear_forgets_local_and_master() {
        let mut roster = roster_of(&["Ana", "Bo"]);
        roster.clear();
        assert!(roster.is_empty());
        assert_eq!(roster.local(), None);
        assert!(!roster.is_local_master());
    }
}
