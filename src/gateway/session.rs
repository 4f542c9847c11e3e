/// Resumable state for one logical gateway session.
///
/// Owned by the active connection; preserved across a pure resume, cleared
/// before a fresh identify.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewaySession {
    /// Sequence number of the last dispatch event received.
    pub sequence: Option<u64>,
    /// Server-issued token required for resuming.
    pub session_id: Option<String>,
    /// Alternate gateway endpoint to resume against.
    pub resume_url: Option<String>,
}

impl GatewaySession {
    /// Advance the sequence counter. Out-of-order values are ignored so the
    /// counter stays monotonic.
    pub fn record_sequence(&mut self, seq: u64) {
        if self.sequence.map_or(true, |current| seq > current) {
            self.sequence = Some(seq);
        }
    }

    /// Capture the identifiers delivered by the ready event.
    pub fn mark_ready(&mut self, session_id: String, resume_url: Option<String>) {
        self.session_id = Some(session_id);
        self.resume_url = resume_url;
    }

    pub fn can_resume(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let mut session = GatewaySession::default();
        session.record_sequence(5);
        assert_eq!(session.sequence, Some(5));
        session.record_sequence(3);
        assert_eq!(session.sequence, Some(5));
        session.record_sequence(6);
        assert_eq!(session.sequence, Some(6));
    }

    #[test]
    fn ready_enables_resume() {
        let mut session = GatewaySession::default();
        assert!(!session.can_resume());
        session.mark_ready("sess".to_string(), Some("wss://resume".to_string()));
        assert!(session.can_resume());
        assert_eq!(session.resume_url.as_deref(), Some("wss://resume"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut session = GatewaySession::default();
        session.record_sequence(9);
        session.mark_ready("sess".to_string(), None);
        session.clear();
        assert_eq!(session, GatewaySession::default());
    }
}
