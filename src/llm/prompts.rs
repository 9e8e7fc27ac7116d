//! Tone analysis prompt.
//!
//! The prompt is the contract between Overthinkr and the LLM. The schema
//! constants below are shared with parse.rs: change them together.

use super::types::ReplyKind;
use crate::text_source::CanonicalText;
use std::fmt;

pub const SCORE_RANGE: (u8, u8) = (1, 10);
pub const CONFIDENCE_RANGE: (u8, u8) = (1, 100);
pub const EXPECTED_REPLIES: usize = 3;

/// Top-level fields of the analysis object, in validation order.
pub const REQUIRED_FIELDS: [&str; 5] = ["tone", "score", "explanation", "confidence", "replies"];

/// A rendered prompt. Owned by one request, never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render the tone analysis prompt for `text`.
///
/// Pure: no timestamps, no randomness. The text is embedded verbatim;
/// JSON escaping happens when the request body is serialized.
pub fn build_prompt(text: &CanonicalText) -> Prompt {
    let reply_lines = ReplyKind::ALL
        .iter()
        .map(|k| format!(r#"    {{"type": "{}", "msg": "<reply text>"}}"#, k.label()))
        .collect::<Vec<_>>()
        .join(",\n");

    Prompt(format!(
        r#"You are 'Overthinkr', an expert in digital linguistics. You read the subtext of short messages: texts, chats, emails.

<message>
{text}
</message>

Analyze the tone of the message above and suggest {n} replies the recipient could send.

Return a valid JSON object ONLY. No prose, no markdown fences.
Format:
{{
  "tone": "<short tone label>",
  "score": <integer {smin}-{smax}, tension level>,
  "explanation": "<short analysis>",
  "confidence": <integer {cmin}-{cmax}>,
  "replies": [
{reply_lines}
  ]
}}"#,
        text = text.as_str(),
        n = EXPECTED_REPLIES,
        smin = SCORE_RANGE.0,
        smax = SCORE_RANGE.1,
        cmin = CONFIDENCE_RANGE.0,
        cmax = CONFIDENCE_RANGE.1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(s: &str) -> CanonicalText {
        CanonicalText::new(s).unwrap()
    }

    #[test]
    fn identical_input_gives_identical_prompt() {
        let a = build_prompt(&canonical("k thanks."));
        let b = build_prompt(&canonical("  k thanks.  "));
        assert_eq!(a.as_str().as_bytes(), b.as_str().as_bytes());
    }

    #[test]
    fn embeds_text_verbatim() {
        let raw = r#"he said "fine" \ whatever {"tone": 1}"#;
        let prompt = build_prompt(&canonical(raw));
        assert!(prompt.as_str().contains(raw));
    }

    #[test]
    fn describes_every_schema_field() {
        let prompt = build_prompt(&canonical("hey"));
        for field in REQUIRED_FIELDS {
            assert!(prompt.as_str().contains(&format!("\"{field}\"")), "missing {field}");
        }
        for kind in ReplyKind::ALL {
            assert!(prompt.as_str().contains(kind.label()));
        }
        assert!(prompt.as_str().contains("1-10"));
        assert!(prompt.as_str().contains("1-100"));
    }

    #[test]
    fn survives_json_transport_encoding() {
        let raw = "line one\nquote \" backslash \\ tab\t{}";
        let prompt = build_prompt(&canonical(raw));
        let body = serde_json::json!({ "contents": [{ "parts": [{ "text": prompt.as_str() }] }] });
        let encoded = serde_json::to_string(&body).unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded["contents"][0]["parts"][0]["text"], prompt.as_str());
    }
}
