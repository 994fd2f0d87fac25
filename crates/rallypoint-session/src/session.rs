//! A participant's session as seen from this client.

use rallypoint_protocol::{ParticipantId, Properties, PropertyValue, READY_KEY};
use rallypoint_transport::ParticipantInfo;

/// One participant in the current room.
///
/// Exists from the moment the participant is reported in the room until it
/// leaves or disconnects. Its custom properties are whatever the transport
/// last reported; only the owner of a session writes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub participant_id: ParticipantId,
    pub nickname: String,
    pub properties: Properties,
}

impl Session {
    /// The participant's readiness flag. Absent or non-boolean means not ready.
    pub fn is_ready(&self) -> bool {
        self.properties
            .get(READY_KEY)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }

    /// Merges changed properties into this session.
    pub fn apply(&mut self, changed: &Properties) {
        self.properties
            .extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl From<ParticipantInfo> for Session {
    fn from(info: ParticipantInfo) -> Self {
        Self {
            participant_id: info.id,
            nickname: info.nickname,
            properties: info.properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ready_missing_or_wrong_type_is_false() {
        let mut session = Session {
            participant_id: ParticipantId(1),
            nickname: "Ana".into(),
            properties: Properties::new(),
        };
        assert!(!session.is_ready());

        session.properties.insert(READY_KEY.into(), PropertyValue::Int(1));
        assert!(!session.is_ready());

        let mut changed = Properties::new();
        changed.insert(READY_KEY.into(), true.into());
        session.apply(&changed);
        assert!(session.is_ready());
    }
}
