//! Prompt builder: pure mapping from turn state to a single prompt string.
//!
//! Every branch instructs the model to answer with bare JSON (no prose, no
//! markdown fences), to keep the reply under 50 words, and to use a fixed
//! field set per turn kind. The normalizer still treats none of that as
//! guaranteed.

use crate::session::ConversationTurn;
use crate::turn::TurnKind;

/// How many of the most recent turns are replayed into the prompt.
pub const PROMPT_WINDOW: usize = 6;

/// Builds the prompt for one turn.
///
/// Branches, in priority order: opening turn, generic acknowledgement,
/// scored answer, unscored answer. `content_summary` is the leading slice
/// of the learning-path description; `last_question` anchors non-opening
/// turns.
pub fn build_prompt(
    topic: &str,
    content_summary: &str,
    kind: TurnKind,
    conversation: &[ConversationTurn],
    last_question: &str,
    user_input: &str,
) -> String {
    match kind {
        TurnKind::Opening { scored } => opening_prompt(topic, scored),
        TurnKind::GenericAck => generic_ack_prompt(topic, last_question),
        TurnKind::Scored => scored_prompt(
            topic,
            content_summary,
            conversation,
            last_question,
            user_input,
        ),
        TurnKind::Unscored => unscored_prompt(
            topic,
            content_summary,
            conversation,
            last_question,
            user_input,
        ),
    }
}

/// Renders the last [`PROMPT_WINDOW`] turns as `sender: text` lines.
fn conversation_window(conversation: &[ConversationTurn]) -> String {
    let start = conversation.len().saturating_sub(PROMPT_WINDOW);
    conversation[start..]
        .iter()
        .filter(|turn| !turn.text.is_empty())
        .map(|turn| format!("{}: {}", turn.sender, turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn opening_prompt(topic: &str, scored: bool) -> String {
    let skeleton = if scored {
        r#"{
    "reply": "Welcome message + first question",
    "hint": "",
    "code": "",
    "score": null,
    "feedback": ""
}"#
    } else {
        r#"{
    "reply": "Welcome message + first question",
    "hint": ""
}"#
    };
    format!(
        r#"You are a friendly study buddy helping the user learn '{topic}'.
Welcome the user and ask the first question about this topic.
Rules:
1. Keep the reply under 50 words.
2. Respond ONLY with JSON, no prose and no markdown fences.
3. Use exactly these fields:
{skeleton}
"#
    )
}

fn generic_ack_prompt(topic: &str, last_question: &str) -> String {
    format!(
        r#"You are a friendly study buddy helping the user learn '{topic}'.
The user replied with a generic acknowledgement instead of answering.

Current question: {last_question}

Rules:
1. Rephrase the current question instead of moving on.
2. Keep the reply under 50 words.
3. Include a short code snippet that illustrates the question.
4. "score" MUST be exactly 0 and "feedback" must note that no answer was given.
5. Respond ONLY with JSON, no prose and no markdown fences:
{{
    "reply": "Rephrased question",
    "hint": "Subtle hint if needed",
    "code": "short snippet",
    "score": 0,
    "feedback": "why the score is 0"
}}
"#
    )
}

fn scored_prompt(
    topic: &str,
    content_summary: &str,
    conversation: &[ConversationTurn],
    last_question: &str,
    user_input: &str,
) -> String {
    let conversation_text = conversation_window(conversation);
    format!(
        r#"You are a friendly study buddy helping the user learn '{topic}'.
Relevant content: {content_summary}

Recent conversation:
{conversation_text}

Current question: {last_question}
User's answer: {user_input}

Rules:
1. Evaluate the answer for correctness (40%), depth (30%), completeness (20%) and terminology (10%).
2. Assign an integer score from 0 to 10: 0-3 incorrect, 4-5 partially correct, 6-7 correct but shallow, 8-9 good, 10 excellent.
3. Include a short code snippet relevant to the question.
4. Provide a hint ONLY when the score is below 6, otherwise leave it empty.
5. Keep the reply under 50 words.
6. Respond ONLY with JSON, no prose and no markdown fences:
{{
    "reply": "Next question or feedback",
    "hint": "Subtle hint if needed",
    "code": "short snippet",
    "score": <0-10>,
    "feedback": "one-line justification of the score"
}}
"#
    )
}

fn unscored_prompt(
    topic: &str,
    content_summary: &str,
    conversation: &[ConversationTurn],
    last_question: &str,
    user_input: &str,
) -> String {
    let conversation_text = conversation_window(conversation);
    format!(
        r#"You are a friendly study buddy helping the user learn '{topic}'.
Relevant content: {content_summary}

Recent conversation:
{conversation_text}

Current question: {last_question}
User's answer: {user_input}

Rules:
1. Keep the reply under 50 words.
2. Provide subtle hints only if the user's answer is partially incorrect.
3. Respond ONLY with JSON, no prose and no markdown fences:
{{
    "reply": "Next question or feedback",
    "hint": "Subtle hint if needed"
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConversationTurn;

    fn turns(n: usize) -> Vec<ConversationTurn> {
        (0..n)
            .map(|i| ConversationTurn::user(format!("turn {i}"), None))
            .collect()
    }

    #[test]
    fn opening_branch_wins() {
        let prompt = build_prompt(
            "Whatsapp",
            "summary",
            TurnKind::Opening { scored: true },
            &[],
            "",
            "hi",
        );
        assert!(prompt.contains("Welcome the user"));
        assert!(prompt.contains(r#""score": null"#));
        assert!(prompt.contains("'Whatsapp'"));
    }

    #[test]
    fn opening_unscored_has_no_score_field() {
        let prompt = build_prompt(
            "Whatsapp",
            "summary",
            TurnKind::Opening { scored: false },
            &[],
            "",
            "hi",
        );
        assert!(!prompt.contains("\"score\""));
    }

    #[test]
    fn generic_ack_rephrases_last_question() {
        let prompt = build_prompt(
            "Whatsapp",
            "summary",
            TurnKind::GenericAck,
            &turns(2),
            "How would you store messages?",
            "ok",
        );
        assert!(prompt.contains("Current question: How would you store messages?"));
        assert!(prompt.contains(r#""score" MUST be exactly 0"#));
    }

    #[test]
    fn scored_branch_embeds_rubric_and_answer() {
        let prompt = build_prompt(
            "Whatsapp",
            "summary",
            TurnKind::Scored,
            &turns(2),
            "Q?",
            "use a message queue",
        );
        assert!(prompt.contains("correctness (40%)"));
        assert!(prompt.contains("User's answer: use a message queue"));
        assert!(prompt.contains("below 6"));
    }

    #[test]
    fn window_keeps_only_last_six_turns() {
        let prompt = build_prompt("T", "s", TurnKind::Scored, &turns(10), "Q?", "a");
        assert!(!prompt.contains("turn 3: "), "older turns must be dropped");
        for i in 4..10 {
            assert!(prompt.contains(&format!("turn {i}")), "missing turn {i}");
        }
    }
}
