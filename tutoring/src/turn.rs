//! Turn classification.
//!
//! One chat turn is handled by exactly one [`TurnKind`], replacing the
//! parallel endpoint variants of earlier revisions (plain reply, +hint,
//! +code, +score) with a single parameterized path.

/// Inputs that count as a generic acknowledgement rather than an answer.
///
/// Matched case-insensitively against the trimmed user input.
pub const GENERIC_ACKS: [&str; 5] = ["ok", "yes", "sure", "got it", "alright"];

/// Returns true when the input is a generic acknowledgement ("ok", "yes", ...).
pub fn is_generic_ack(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    GENERIC_ACKS.iter().any(|ack| *ack == normalized)
}

/// The kind of tutoring turn being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// First turn of a conversation: welcome the user and ask an opening
    /// question. `scored` controls whether the reply skeleton carries the
    /// scoring fields.
    Opening { scored: bool },
    /// The user acknowledged without answering; rephrase the last question.
    /// The score is forced to zero downstream.
    GenericAck,
    /// A regular answer turn with rubric-based scoring.
    Scored,
    /// A regular answer turn without scoring (hint-only mode).
    Unscored,
}

impl TurnKind {
    /// Classifies a turn. Branch priority: opening, then scoring mode, then
    /// generic-acknowledgement detection.
    pub fn classify(user_input: &str, is_first_turn: bool, scored: bool) -> Self {
        if is_first_turn {
            return Self::Opening { scored };
        }
        if !scored {
            return Self::Unscored;
        }
        if is_generic_ack(user_input) {
            Self::GenericAck
        } else {
            Self::Scored
        }
    }

    /// Whether this turn produces `score`/`feedback` fields.
    pub fn is_scored(self) -> bool {
        matches!(self, Self::GenericAck | Self::Scored)
    }

    /// Whether this turn is a generic acknowledgement.
    pub fn is_generic_ack(self) -> bool {
        matches!(self, Self::GenericAck)
    }

    /// Whether this turn opens the conversation.
    pub fn is_opening(self) -> bool {
        matches!(self, Self::Opening { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_detection_is_case_insensitive() {
        for input in ["ok", "OK", " Yes ", "SURE", "Got It", "alright"] {
            assert!(is_generic_ack(input), "expected ack: {input:?}");
        }
        assert!(!is_generic_ack("okay then"));
        assert!(!is_generic_ack("a partition key groups rows"));
    }

    #[test]
    fn first_turn_wins_over_ack() {
        assert_eq!(
            TurnKind::classify("ok", true, true),
            TurnKind::Opening { scored: true }
        );
    }

    #[test]
    fn unscored_mode_never_yields_generic_ack() {
        assert_eq!(TurnKind::classify("ok", false, false), TurnKind::Unscored);
    }

    #[test]
    fn scored_classification() {
        assert_eq!(TurnKind::classify("ok", false, true), TurnKind::GenericAck);
        assert_eq!(
            TurnKind::classify("use a message queue", false, true),
            TurnKind::Scored
        );
    }
}
