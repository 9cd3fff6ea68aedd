//! Response normalizer: turns raw model output into a usable reply.
//!
//! The upstream model is instructed to answer with bare JSON, but it does
//! not reliably comply. Normalization therefore degrades through widening
//! fallback tiers instead of failing the request:
//!
//! 1. strip markdown fences, strict JSON parse;
//! 2. on parse failure, independent regex salvage of each field;
//! 3. with nothing to parse at all, a fixed synthetic reply.
//!
//! The regex tier is a tolerance mechanism for an unreliable upstream, not a
//! parser; it stays a clearly bounded fallback and is never the primary path.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::turn::TurnKind;

/// Reply used when the model output contains no recognizable `reply` field.
pub const MISSING_REPLY: &str = "Please provide more details about your approach.";

/// Reply used when there is no model output to parse at all.
pub const SAFE_REPLY: &str = "Please elaborate on your system design approach.";

/// Feedback used when a scored reply carries no feedback of its own.
pub const FEEDBACK_PLACEHOLDER: &str = "No detailed feedback available.";

/// Feedback forced onto generic-acknowledgement turns.
pub const GENERIC_ACK_FEEDBACK: &str = "Generic response - no answer provided";

/// The normalized result of one model invocation.
///
/// `score` and `feedback` are present only on scored turn kinds; string
/// fields default to empty rather than null when unobtainable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedModelReply {
    pub reply: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl ParsedModelReply {
    /// Re-applies the kind-dependent scoring rules to a reply that was
    /// produced under a possibly different turn kind.
    ///
    /// The reply cache keys on `(learning_path, input, conversation)` only,
    /// so a reply cached from a scored turn can be served to an unscored one
    /// and vice versa. This keeps the score/feedback contract per kind.
    pub fn conform_to(mut self, kind: TurnKind) -> Self {
        if !kind.is_scored() {
            self.score = None;
            self.feedback = None;
        } else if kind.is_generic_ack() {
            self.score = Some(0);
            self.feedback = Some(GENERIC_ACK_FEEDBACK.to_string());
        } else {
            self.score = self.score.or(Some(5));
            if self.feedback.as_deref().is_none_or(|f| f.trim().is_empty()) {
                self.feedback = Some(FEEDBACK_PLACEHOLDER.to_string());
            }
        }
        self
    }
}

/// Normalizes raw model text into a [`ParsedModelReply`].
///
/// Never fails: structural problems in the input degrade through the
/// fallback tiers. Scoring rules:
/// - unscored kinds never carry `score`/`feedback`;
/// - a missing or non-numeric score defaults to 0 on generic-ack turns and
///   5 otherwise;
/// - scores are clamped to the nearest integer in `[0, 10]`;
/// - generic-ack turns force `score = 0` and a fixed feedback line, because
///   models unreliably obey the "score must be 0" prompt instruction.
pub fn normalize(raw: &str, kind: TurnKind) -> ParsedModelReply {
    let body = strip_fences(raw);

    let draft = if body.is_empty() {
        warn!("empty model output; using synthetic fallback reply");
        Draft::safe_fallback()
    } else {
        match serde_json::from_str::<RawReply>(body) {
            Ok(raw) => Draft::from(raw),
            Err(err) => {
                debug!(%err, "strict JSON parse failed; salvaging fields by regex");
                Draft::salvage(body)
            }
        }
    };

    finalize(draft, kind)
}

/// Strips a leading ```` ```json ```` / ```` ``` ```` fence and a trailing
/// ```` ``` ```` fence, if present.
fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    for prefix in ["```json", "```"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest;
            break;
        }
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Loose JSON shape of a model reply; `score` may be a number, a numeric
/// string, or null depending on the model's mood.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    hint: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    score: Option<serde_json::Value>,
    #[serde(default)]
    feedback: Option<String>,
}

/// Intermediate result of a parse tier, before kind-aware finalization.
#[derive(Debug, Default)]
struct Draft {
    reply: Option<String>,
    hint: String,
    code: String,
    score: Option<f64>,
    feedback: Option<String>,
}

static REPLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""reply"\s*:\s*"([^"]*)""#).expect("valid regex"));
static HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""hint"\s*:\s*"([^"]*)""#).expect("valid regex"));
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""code"\s*:\s*"([^"]*)""#).expect("valid regex"));
static FEEDBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""feedback"\s*:\s*"([^"]*)""#).expect("valid regex"));
static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""score"\s*:\s*(-?\d+(?:\.\d+)?)"#).expect("valid regex"));

impl Draft {
    /// Tier 3: nothing to parse; fixed synthetic reply.
    fn safe_fallback() -> Self {
        Self {
            reply: Some(SAFE_REPLY.to_string()),
            ..Self::default()
        }
    }

    /// Tier 2: extract each field independently from near-JSON text.
    fn salvage(body: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(body)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };
        Self {
            reply: capture(&REPLY_RE),
            hint: capture(&HINT_RE).unwrap_or_default(),
            code: capture(&CODE_RE).unwrap_or_default(),
            score: capture(&SCORE_RE).and_then(|s| s.parse::<f64>().ok()),
            feedback: capture(&FEEDBACK_RE),
        }
    }
}

impl From<RawReply> for Draft {
    fn from(raw: RawReply) -> Self {
        Self {
            reply: raw.reply,
            hint: raw.hint,
            code: raw.code,
            score: raw.score.as_ref().and_then(score_value),
            feedback: raw.feedback,
        }
    }
}

/// Accepts numeric scores and numeric strings; anything else is absent.
fn score_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Applies post-processing, defaults and the generic-ack override.
fn finalize(draft: Draft, kind: TurnKind) -> ParsedModelReply {
    let reply = match draft.reply {
        Some(r) if !r.trim().is_empty() => r.trim().to_string(),
        _ => MISSING_REPLY.to_string(),
    };

    let (score, feedback) = if kind.is_scored() {
        let default_score = if kind.is_generic_ack() { 0 } else { 5 };
        let score = draft
            .score
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(0.0, 10.0) as u8)
            .unwrap_or(default_score);
        let feedback = draft
            .feedback
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| FEEDBACK_PLACEHOLDER.to_string());

        if kind.is_generic_ack() {
            // Enforced server-side: the prompt's "score must be 0" instruction
            // is not reliably honored by the model.
            (Some(0), Some(GENERIC_ACK_FEEDBACK.to_string()))
        } else {
            (Some(score), Some(feedback))
        }
    } else {
        (None, None)
    };

    ParsedModelReply {
        reply,
        hint: draft.hint.trim().to_string(),
        code: clean_code(&draft.code),
        score,
        feedback,
    }
}

/// Unescapes literal `\n`/`\t` sequences and strips stray triple-quote
/// markers that models sometimes wrap snippets in.
fn clean_code(code: &str) -> String {
    code.replace("\\n", "\n")
        .replace("\\t", "    ")
        .replace("\"\"\"", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORED: TurnKind = TurnKind::Scored;
    const ACK: TurnKind = TurnKind::GenericAck;
    const UNSCORED: TurnKind = TurnKind::Unscored;

    #[test]
    fn parses_clean_json() {
        let raw = r#"{"reply": "What is a shard?", "hint": "", "code": "", "score": 7, "feedback": "good"}"#;
        let parsed = normalize(raw, SCORED);
        assert_eq!(parsed.reply, "What is a shard?");
        assert_eq!(parsed.score, Some(7));
        assert_eq!(parsed.feedback.as_deref(), Some("good"));
    }

    #[test]
    fn fenced_output_equals_unfenced() {
        let body = r#"{"reply": "Next question", "hint": "h", "code": "", "score": 8, "feedback": "ok"}"#;
        let fenced_json = format!("```json\n{body}\n```");
        let fenced_plain = format!("```\n{body}\n```");
        assert_eq!(normalize(body, SCORED), normalize(&fenced_json, SCORED));
        assert_eq!(normalize(body, SCORED), normalize(&fenced_plain, SCORED));
    }

    #[test]
    fn salvages_reply_from_malformed_json() {
        let raw = r#"Sure! Here is my answer: {"reply": "Consider consistent hashing", "hint": "rings", "score": 6,"#;
        let parsed = normalize(raw, SCORED);
        assert_eq!(parsed.reply, "Consider consistent hashing");
        assert_eq!(parsed.hint, "rings");
        assert_eq!(parsed.score, Some(6));
    }

    #[test]
    fn salvage_defaults_when_fields_missing() {
        let parsed = normalize("total nonsense, not even close to JSON", SCORED);
        assert_eq!(parsed.reply, MISSING_REPLY);
        assert_eq!(parsed.hint, "");
        assert_eq!(parsed.score, Some(5));
        assert_eq!(parsed.feedback.as_deref(), Some(FEEDBACK_PLACEHOLDER));
    }

    #[test]
    fn salvage_score_default_is_ack_aware() {
        let parsed = normalize("nonsense", ACK);
        assert_eq!(parsed.score, Some(0));
    }

    #[test]
    fn empty_output_yields_safe_reply() {
        let parsed = normalize("   \n", SCORED);
        assert_eq!(parsed.reply, SAFE_REPLY);
        assert_eq!(parsed.code, "");
        assert_eq!(parsed.score, Some(5));
    }

    #[test]
    fn score_is_clamped_to_range() {
        for (raw_score, expected) in [("14", 10), ("-3", 0), ("7.6", 8), ("null", 5)] {
            let raw = format!(r#"{{"reply": "r", "score": {raw_score}}}"#);
            let parsed = normalize(&raw, SCORED);
            assert_eq!(parsed.score, Some(expected), "score {raw_score}");
        }
    }

    #[test]
    fn numeric_string_score_is_accepted() {
        let parsed = normalize(r#"{"reply": "r", "score": "9"}"#, SCORED);
        assert_eq!(parsed.score, Some(9));
    }

    #[test]
    fn generic_ack_overrides_model_score() {
        let raw = r#"{"reply": "Let me rephrase", "hint": "", "code": "", "score": 9, "feedback": "great"}"#;
        let parsed = normalize(raw, ACK);
        assert_eq!(parsed.score, Some(0));
        assert_eq!(parsed.feedback.as_deref(), Some(GENERIC_ACK_FEEDBACK));
    }

    #[test]
    fn unscored_kinds_drop_scoring_fields() {
        let raw = r#"{"reply": "r", "hint": "h", "score": 9, "feedback": "great"}"#;
        let parsed = normalize(raw, UNSCORED);
        assert_eq!(parsed.score, None);
        assert_eq!(parsed.feedback, None);

        let opening = normalize(raw, TurnKind::Opening { scored: true });
        assert_eq!(opening.score, None);
    }

    #[test]
    fn conform_strips_scoring_for_unscored_kinds() {
        let scored = normalize(r#"{"reply": "r", "score": 7, "feedback": "good"}"#, SCORED);
        let conformed = scored.conform_to(UNSCORED);
        assert_eq!(conformed.score, None);
        assert_eq!(conformed.feedback, None);
    }

    #[test]
    fn conform_applies_ack_override_and_scored_defaults() {
        let unscored = normalize(r#"{"reply": "r", "hint": "h"}"#, UNSCORED);

        let as_ack = unscored.clone().conform_to(ACK);
        assert_eq!(as_ack.score, Some(0));
        assert_eq!(as_ack.feedback.as_deref(), Some(GENERIC_ACK_FEEDBACK));

        let as_scored = unscored.conform_to(SCORED);
        assert_eq!(as_scored.score, Some(5));
        assert_eq!(as_scored.feedback.as_deref(), Some(FEEDBACK_PLACEHOLDER));
    }

    #[test]
    fn code_is_unescaped_and_cleaned() {
        let raw = r#"{"reply": "r", "code": "\"\"\"fn main() {\\n\\tprintln!(\"hi\");\\n}\"\"\""}"#;
        let parsed = normalize(raw, UNSCORED);
        assert_eq!(parsed.code, "fn main() {\n    println!(\"hi\");\n}");
    }
}
