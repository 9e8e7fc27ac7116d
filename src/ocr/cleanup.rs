//! Noise cleanup for OCR output.
//!
//! Screenshots of chats come back from tesseract with form feeds, ragged
//! trailing spaces, stacks of blank lines, and words split across lines
//! with a hyphen. None of that carries tone, so it is removed before the
//! text becomes canonical input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Control characters other than newline and tab.
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B-\x1F\x7F]").expect("valid regex"));

static TRAILING_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]+$").expect("valid regex"));

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// "rea-\nsonable" -> "reasonable". Only between lowercase letters.
static HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{Ll})-\n(\p{Ll})").expect("valid regex"));

/// Normalize raw OCR text. The result is trimmed.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = CONTROL_CHARS.replace_all(&text, "");
    let text = TRAILING_SPACE.replace_all(&text, "");
    let text = HYPHEN_BREAK.replace_all(&text, "$1$2");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}
