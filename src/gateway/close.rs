//! Close-code classification: a pure, total mapping from the closure code the
//! transport reported to what the connection should do about it.

use crate::gateway::events::close_code;

/// What a classified close code asks of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The session is still valid, reconnect and resume from the last sequence.
    Resume,
    /// The session is gone, reconnect and identify from scratch.
    Reidentify,
    /// Retrying cannot succeed; surface to the host and stop.
    Fatal,
}

/// Classification result. Codes absent from the catalog come back as
/// `Unclassified` so the caller picks a policy instead of stalling silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    Classified {
        outcome: CloseOutcome,
        message: &'static str,
    },
    Unclassified(u16),
}

const fn classified(outcome: CloseOutcome, message: &'static str) -> CloseAction {
    CloseAction::Classified { outcome, message }
}

/// Classify a close code against the published catalog.
pub fn classify(code: u16) -> CloseAction {
    use CloseOutcome::{Fatal, Reidentify, Resume};
    match code {
        close_code::NORMAL => classified(
            Reidentify,
            "The connection was closed normally. Starting a new session.",
        ),
        close_code::GOING_AWAY => classified(
            Reidentify,
            "The gateway endpoint is going away. Starting a new session.",
        ),
        close_code::UNKNOWN_ERROR => classified(
            Resume,
            "We're not sure what went wrong. Try reconnecting?",
        ),
        close_code::UNKNOWN_OPCODE => classified(
            Reidentify,
            "You sent an invalid Gateway opcode or an invalid payload for an opcode. Don't do that!",
        ),
        close_code::DECODE_ERROR => classified(
            Reidentify,
            "You sent an invalid payload to the gateway. Don't do that!",
        ),
        close_code::NOT_AUTHENTICATED => classified(
            Reidentify,
            "You sent us a payload prior to identifying.",
        ),
        close_code::AUTH_FAILED => classified(
            Fatal,
            "The account token sent with your identify payload is incorrect.",
        ),
        close_code::ALREADY_AUTHENTICATED => classified(
            Reidentify,
            "You sent more than one identify payload. Don't do that!",
        ),
        close_code::INVALID_SEQ => classified(
            Reidentify,
            "The sequence sent when resuming the session was invalid. Reconnect and start a new session.",
        ),
        close_code::RATE_LIMITED => classified(
            Resume,
            "Woah nelly! You're sending payloads to us too quickly. Slow it down! You will be disconnected on receiving this.",
        ),
        close_code::SESSION_TIMED_OUT => classified(
            Reidentify,
            "Your session timed out. Reconnect and start a new one.",
        ),
        close_code::INVALID_SHARD => classified(
            Fatal,
            "You sent us an invalid shard when identifying.",
        ),
        close_code::SHARDING_REQUIRED => classified(
            Fatal,
            "The session would have handled too many guilds - you are required to shard your connection in order to connect.",
        ),
        close_code::INVALID_API_VERSION => classified(
            Fatal,
            "You sent an invalid version for the gateway.",
        ),
        close_code::INVALID_INTENTS => classified(
            Fatal,
            "You sent an invalid intent for a Gateway Intent. You may have incorrectly calculated the bitwise value.",
        ),
        close_code::DISALLOWED_INTENTS => classified(
            Fatal,
            "You sent a disallowed intent for a Gateway Intent. You may have tried to specify an intent that you have not enabled or are not approved for.",
        ),
        other => CloseAction::Unclassified(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome_of(code: u16) -> CloseOutcome {
        match classify(code) {
            CloseAction::Classified { outcome, .. } => outcome,
            CloseAction::Unclassified(c) => panic!("code {c} should be classified"),
        }
    }

    #[test]
    fn resumable_codes() {
        assert_eq!(outcome_of(close_code::UNKNOWN_ERROR), CloseOutcome::Resume);
        assert_eq!(outcome_of(close_code::RATE_LIMITED), CloseOutcome::Resume);
    }

    #[test]
    fn reidentify_codes() {
        for code in [
            close_code::NORMAL,
            close_code::GOING_AWAY,
            close_code::UNKNOWN_OPCODE,
            close_code::DECODE_ERROR,
            close_code::NOT_AUTHENTICATED,
            close_code::ALREADY_AUTHENTICATED,
            close_code::INVALID_SEQ,
            close_code::SESSION_TIMED_OUT,
        ] {
            assert_eq!(outcome_of(code), CloseOutcome::Reidentify, "code {code}");
        }
    }

    #[test]
    fn fatal_codes() {
        for code in [
            close_code::AUTH_FAILED,
            close_code::INVALID_SHARD,
            close_code::SHARDING_REQUIRED,
            close_code::INVALID_API_VERSION,
            close_code::INVALID_INTENTS,
            close_code::DISALLOWED_INTENTS,
        ] {
            assert_eq!(outcome_of(code), CloseOutcome::Fatal, "code {code}");
        }
    }

    #[test]
    fn every_catalog_code_keeps_its_message() {
        let expected: &[(u16, &str)] = &[
            (4000, "We're not sure what went wrong. Try reconnecting?"),
            (4004, "The account token sent with your identify payload is incorrect."),
            (4008, "Woah nelly! You're sending payloads to us too quickly. Slow it down! You will be disconnected on receiving this."),
            (4009, "Your session timed out. Reconnect and start a new one."),
        ];
        for (code, msg) in expected {
            match classify(*code) {
                CloseAction::Classified { message, .. } => assert_eq!(message, *msg),
                CloseAction::Unclassified(_) => panic!("code {code} should be classified"),
            }
        }
    }

    #[test]
    fn unknown_codes_are_unclassified_not_swallowed() {
        assert_eq!(classify(4999), CloseAction::Unclassified(4999));
        assert_eq!(classify(4006), CloseAction::Unclassified(4006));
        assert_eq!(classify(1006), CloseAction::Unclassified(1006));
    }
}
