//! Result validator: untrusted LLM text in, typed [`AnalysisResult`] out.
//!
//! The payload is parsed as generic JSON first and then checked field by
//! field, so a failure can name the offending field instead of surfacing a
//! serde position error.

use super::prompts::{CONFIDENCE_RANGE, EXPECTED_REPLIES, SCORE_RANGE};
use super::types::{AnalysisResult, ReplyOption};
use crate::error::ParseError;
use serde_json::{Map, Value};

/// Parse and validate the inner text payload of a Gemini response.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, ParseError> {
    let json_str = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(json_str).map_err(|e| ParseError::NotJson(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::mismatch("$", "expected a JSON object"))?;

    let tone = require_string(obj, "tone")?;
    if tone.trim().is_empty() {
        return Err(ParseError::mismatch("tone", "must not be empty"));
    }
    let score = require_int_in(obj, "score", SCORE_RANGE)?;
    let explanation = require_string(obj, "explanation")?;
    let confidence = require_int_in(obj, "confidence", CONFIDENCE_RANGE)?;
    let replies = require_replies(obj)?;

    if replies.len() != EXPECTED_REPLIES {
        log::warn!(
            "[LLM] Expected {} replies, got {}, keeping them as-is",
            EXPECTED_REPLIES,
            replies.len()
        );
    }

    Ok(AnalysisResult {
        tone: tone.to_string(),
        score,
        explanation: explanation.to_string(),
        confidence,
        replies,
    })
}

/// Remove one surrounding markdown code fence (```json ... ```), if any.
///
/// Gemini wraps JSON in fences now and then even when told not to.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    match body.split_once('\n') {
        Some((_lang, inner)) => inner.trim(),
        None => body.trim(),
    }
}

fn require<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ParseError> {
    obj.get(field)
        .ok_or_else(|| ParseError::mismatch(field, "missing"))
}

fn require_string<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str, ParseError> {
    require(obj, field)?
        .as_str()
        .ok_or_else(|| ParseError::mismatch(field, "expected a string"))
}

fn require_int_in(
    obj: &Map<String, Value>,
    field: &str,
    (min, max): (u8, u8),
) -> Result<u8, ParseError> {
    let n = require(obj, field)?
        .as_f64()
        .ok_or_else(|| ParseError::mismatch(field, "expected a number"))?;
    if n.fract() != 0.0 {
        return Err(ParseError::mismatch(
            field,
            format!("expected an integer, got {}", n),
        ));
    }
    if n < f64::from(min) || n > f64::from(max) {
        return Err(ParseError::mismatch(
            field,
            format!("expected {}-{}, got {}", min, max, n),
        ));
    }
    Ok(n as u8)
}

fn require_replies(obj: &Map<String, Value>) -> Result<Vec<ReplyOption>, ParseError> {
    let entries = require(obj, "replies")?
        .as_array()
        .ok_or_else(|| ParseError::mismatch("replies", "expected an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let entry = entry
                .as_object()
                .ok_or_else(|| ParseError::mismatch(format!("replies[{i}]"), "expected an object"))?;
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::mismatch(format!("replies[{i}].type"), "expected a string"))?;
            let msg = entry
                .get("msg")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::mismatch(format!("replies[{i}].msg"), "expected a string"))?;
            Ok(ReplyOption {
                kind: kind.to_string(),
                msg: msg.to_string(),
            })
        })
        .collect()
}
