//! The lobby's room list.

use std::collections::BTreeMap;

use rallypoint_protocol::RoomSummary;

/// Cache of the rooms the lobby currently advertises, keyed by name.
///
/// Room-list updates are deltas and may repeat; applying the same update
/// twice leaves the directory exactly as applying it once.
#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    rooms: BTreeMap<String, RoomSummary>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a room-list update.
    pub fn apply(&mut self, updates: &[RoomSummary]) {
        for summary in updates {
            if summary.removed {
                self.rooms.remove(&summary.name);
            } else {
                self.rooms.insert(summary.name.clone(), summary.clone());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&RoomSummary> {
        self.rooms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// All rooms, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &RoomSummary> {
        self.rooms.values()
    }

    /// Rooms a join could succeed in right now.
    pub fn joinable(&self) -> impl Iterator<Item = &RoomSummary> {
        self.rooms.values().filter(|r| r.is_joinable())
    }
}
