//! Tone analysis result types.
//!
//! These match the JSON schema the tone prompt asks Gemini for. They are
//! serialize-only: `parse_analysis` is the one way in, so every
//! `AnalysisResult` has passed its range and field checks.

use serde::Serialize;

/// Score at which the presentation layer flags a message as tense.
pub const TENSION_THRESHOLD: u8 = 5;

/// Structured tone analysis for one piece of canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub tone: String,
    /// Tension score, 1 (relaxed) to 10 (hostile).
    pub score: u8,
    pub explanation: String,
    /// Model's self-reported confidence, 1 to 100.
    pub confidence: u8,
    pub replies: Vec<ReplyOption>,
}

impl AnalysisResult {
    pub fn is_tense(&self) -> bool {
        self.score > TENSION_THRESHOLD
    }
}

/// A suggested reply. The presentation layer picks an icon from `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyOption {
    #[serde(rename = "type")]
    pub kind: String,
    pub msg: String,
}

impl ReplyOption {
    /// The known reply style, or `None` for a type the model invented.
    pub fn known_kind(&self) -> Option<ReplyKind> {
        ReplyKind::from_label(&self.kind)
    }
}

/// Reply styles the prompt asks for, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    Confident,
    Calm,
    Witty,
}

impl ReplyKind {
    pub const ALL: [ReplyKind; 3] = [ReplyKind::Confident, ReplyKind::Calm, ReplyKind::Witty];

    pub fn label(self) -> &'static str {
        match self {
            ReplyKind::Confident => "Confident",
            ReplyKind::Calm => "Calm",
            ReplyKind::Witty => "Witty",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }
}
