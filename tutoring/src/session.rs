//! Conversation session: the caller-supplied, caller-returned context blob.
//!
//! The server is stateless; the whole conversation travels with each request
//! and is handed back updated. Known fields (`conversation`, `last_question`)
//! are typed; everything else the caller put into the context is preserved in
//! a flattened pass-through map and never dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::ParsedModelReply;
use crate::turn::TurnKind;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::System => write!(f, "system"),
        }
    }
}

/// One entry of the append-only conversation log, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

impl ConversationTurn {
    /// A plain user turn, optionally annotated with the score its answer earned.
    pub fn user(text: impl Into<String>, score: Option<u8>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            hint: None,
            code: None,
            score,
        }
    }

    /// A system turn carrying the model reply.
    pub fn system(text: impl Into<String>, hint: impl Into<String>, code: Option<String>) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
            hint: Some(hint.into()),
            code,
            score: None,
        }
    }
}

/// The conversation context exchanged with the caller on every request.
///
/// Unknown caller fields round-trip through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
    #[serde(default)]
    pub last_question: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConversationSession {
    /// Concatenated text of every turn, used for the response-cache hash.
    pub fn conversation_text(&self) -> String {
        self.conversation
            .iter()
            .map(|turn| turn.text.as_str())
            .collect()
    }
}

/// Applies one completed turn to the session and returns the updated value.
///
/// Appends exactly one user turn and one system turn, then anchors
/// `last_question` on the new reply. The user turn is annotated with a score
/// only when the turn is not the opening turn and a score is present. The
/// conversation is never truncated here; prompt windowing happens at prompt
/// build time.
pub fn apply(
    mut session: ConversationSession,
    user_input: &str,
    reply: &ParsedModelReply,
    kind: TurnKind,
) -> ConversationSession {
    let user_score = if kind.is_opening() { None } else { reply.score };
    session
        .conversation
        .push(ConversationTurn::user(user_input, user_score));

    let code = if reply.code.is_empty() {
        None
    } else {
        Some(reply.code.clone())
    };
    session
        .conversation
        .push(ConversationTurn::system(&reply.reply, &reply.hint, code));

    session.last_question = reply.reply.clone();
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(text: &str, score: Option<u8>) -> ParsedModelReply {
        ParsedModelReply {
            reply: text.to_string(),
            hint: "think about sharding".to_string(),
            code: String::new(),
            score,
            feedback: None,
        }
    }

    #[test]
    fn grows_by_exactly_two() {
        let session = ConversationSession::default();
        let updated = apply(session, "hi", &reply("Welcome!", None), TurnKind::Opening {
            scored: false,
        });

        assert_eq!(updated.conversation.len(), 2);
        assert_eq!(updated.conversation[0].sender, Sender::User);
        assert_eq!(updated.conversation[1].sender, Sender::System);
        assert_eq!(updated.last_question, "Welcome!");
    }

    #[test]
    fn user_turn_scored_only_after_opening() {
        let opening = apply(
            ConversationSession::default(),
            "hi",
            &reply("Q1?", Some(7)),
            TurnKind::Opening { scored: true },
        );
        assert_eq!(opening.conversation[0].score, None);

        let scored = apply(opening, "an answer", &reply("Q2?", Some(7)), TurnKind::Scored);
        assert_eq!(scored.conversation[2].score, Some(7));
        assert_eq!(scored.conversation.len(), 4);
    }

    #[test]
    fn extra_fields_round_trip() {
        let body = json!({
            "conversation": [],
            "last_question": "",
            "user_id": "u-42",
            "theme": {"dark": true}
        });
        let session: ConversationSession = serde_json::from_value(body).unwrap();
        let updated = apply(session, "hi", &reply("Q1?", None), TurnKind::Opening {
            scored: false,
        });

        let out = serde_json::to_value(&updated).unwrap();
        assert_eq!(out["user_id"], "u-42");
        assert_eq!(out["theme"]["dark"], true);
    }

    #[test]
    fn code_omitted_when_empty() {
        let updated = apply(
            ConversationSession::default(),
            "an answer",
            &reply("next", Some(5)),
            TurnKind::Scored,
        );
        assert_eq!(updated.conversation[1].code, None);
        assert_eq!(
            updated.conversation[1].hint.as_deref(),
            Some("think about sharding")
        );
    }

    #[test]
    fn conversation_text_concatenates() {
        let mut session = ConversationSession::default();
        session.conversation.push(ConversationTurn::user("ab", None));
        session
            .conversation
            .push(ConversationTurn::system("cd", "", None));
        assert_eq!(session.conversation_text(), "abcd");
    }
}
