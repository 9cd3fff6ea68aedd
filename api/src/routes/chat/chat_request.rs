use serde::{Deserialize, Serialize};
use tutoring::normalize::ParsedModelReply;
use tutoring::session::ConversationSession;

/// Request body for `POST /design_chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Raw user input for this turn.
    pub message: String,
    /// Conversation state as returned by the previous response; a brand-new
    /// conversation may omit it.
    #[serde(default)]
    pub context: ConversationSession,
    /// Title of the learning path being studied.
    pub learning_path: String,
    /// True on the first turn of a conversation.
    #[serde(default)]
    pub is_first_response: bool,
    /// False switches the turn to hint-only mode without scoring.
    #[serde(default = "default_scored")]
    pub scored: bool,
}

fn default_scored() -> bool {
    true
}

/// Response body for `POST /design_chat`.
///
/// `score` and `feedback` appear only on scored turns; `code` only when the
/// model produced a snippet. `context` is the updated conversation state the
/// caller must echo back on the next turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub hint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub context: ConversationSession,
}

impl ChatResponse {
    pub fn from_turn(reply: ParsedModelReply, context: ConversationSession) -> Self {
        let code = if reply.code.is_empty() {
            None
        } else {
            Some(reply.code)
        };
        Self {
            reply: reply.reply,
            hint: reply.hint,
            code,
            score: reply.score,
            feedback: reply.feedback,
            context,
        }
    }
}
