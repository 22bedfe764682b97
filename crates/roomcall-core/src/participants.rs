use crate::events::Participant;

/// Remote participants currently in the room.
///
/// Updated by the room event loop. Read by native UI layers.
#[derive(Debug, Clone, Default)]
pub struct ParticipantManager {
    participants: Vec<Participant>,
}

impl ParticipantManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_participant(&mut self, participant: Participant) {
        if !self.participants.iter().any(|p| p.sid == participant.sid) {
            self.participants.push(participant);
        }
    }

    pub fn remove_participant(&mut self, sid: &str) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.sid == sid)?;
        Some(self.participants.remove(index))
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, sid: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.sid == sid)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }
}
