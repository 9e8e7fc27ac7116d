//! Tone analysis pipeline driver.
//!
//! text or screenshot → canonical text → prompt → Gemini → validate → session
//!
//! The driver is the only writer of the session. It takes the `Processing`
//! slot under the session lock, runs the stages without holding it, and
//! writes the terminal phase back with the run's ticket. Every stage error
//! becomes a `Failure` phase; nothing escapes and nothing is retried. If
//! the `submit` future is dropped mid-run, its guard moves the session to
//! `Failure(Cancelled)`.

use crate::config::{ConfigError, GeminiConfig, Settings};
use crate::error::AnalysisError;
use crate::llm::{self, AnalysisResult, GeminiClient};
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::session::{Phase, Rejected, RunGuard, SessionHandle};
use crate::text_source::{self, CanonicalText};
use std::path::PathBuf;
use std::sync::Arc;

/// What the user handed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Text(String),
    Image(PathBuf),
}

enum Source {
    Text(CanonicalText),
    Image(PathBuf),
}

pub struct Pipeline {
    client: GeminiClient,
    ocr: Arc<dyn OcrEngine>,
}

impl Pipeline {
    pub fn new(client: GeminiClient, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { client, ocr }
    }

    /// Gemini over HTTP plus tesseract, configured from `settings`.
    ///
    /// A missing tesseract binary does not block text analysis; screenshot
    /// submissions will fail with an OCR error instead.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let client = GeminiClient::new(GeminiConfig::from_settings(settings)?);
        let ocr = TesseractEngine::locate(settings.tesseract_path.as_deref(), &settings.ocr_language)
            .unwrap_or_else(|e| {
                log::warn!("[OCR] {}", e);
                TesseractEngine::new("tesseract", settings.ocr_language.as_str())
            });
        Ok(Self::new(client, Arc::new(ocr)))
    }

    /// Run one full analysis and return the session's resulting phase.
    ///
    /// Blocked (session untouched, nothing called) when the typed text is
    /// empty or another run is in flight.
    pub async fn submit(
        &self,
        session: &SessionHandle,
        submission: Submission,
    ) -> Result<Phase, Rejected> {
        let pipeline_start = std::time::Instant::now();

        let (guard, source) = match submission {
            Submission::Text(raw) => {
                let text = CanonicalText::new(&raw).map_err(|_| {
                    log::info!("[PIPELINE] Empty input, submit blocked");
                    Rejected::EmptyInput
                })?;
                let guard = session.begin(Some(text.clone()))?;
                (guard, Source::Text(text))
            }
            Submission::Image(path) => (session.begin(None)?, Source::Image(path)),
        };

        let outcome = self.run(session, &guard, source).await;
        match &outcome {
            Ok(_) => log::info!(
                "[PIPELINE] Total: {}ms",
                pipeline_start.elapsed().as_millis()
            ),
            Err(e) => log::warn!(
                "[PIPELINE] Failed after {}ms ({:?}): {}",
                pipeline_start.elapsed().as_millis(),
                e.kind(),
                e
            ),
        }

        Ok(session.with(|s| {
            if let Some(ticket) = guard.disarm() {
                s.finish(ticket, outcome);
            }
            s.phase().clone()
        }))
    }

    /// OCR a screenshot without analyzing it.
    ///
    /// On success the session returns to `Idle` holding the recognized text,
    /// so the user can check it before submitting.
    pub async fn scan(&self, session: &SessionHandle, path: PathBuf) -> Result<Phase, Rejected> {
        let guard = session.begin(None)?;
        let outcome = text_source::from_image(self.ocr.as_ref(), &path).await;
        Ok(session.with(|s| {
            if let Some(ticket) = guard.disarm() {
                s.finish_scan(ticket, outcome);
            }
            s.phase().clone()
        }))
    }

    async fn run(
        &self,
        session: &SessionHandle,
        guard: &RunGuard,
        source: Source,
    ) -> Result<AnalysisResult, AnalysisError> {
        let text = match source {
            Source::Text(text) => text,
            Source::Image(path) => {
                let text = text_source::from_image(self.ocr.as_ref(), &path).await?;
                if let Some(ticket) = guard.ticket() {
                    session.with(|s| s.set_input(ticket, text.clone()));
                }
                text
            }
        };
        analyze(&self.client, &text).await
    }
}

/// Prompt, invoke, validate. The session-free core of one analysis.
pub async fn analyze(
    client: &GeminiClient,
    text: &CanonicalText,
) -> Result<AnalysisResult, AnalysisError> {
    log::info!("[PIPELINE] Analyzing {} chars", text.as_str().chars().count());
    let prompt = llm::build_prompt(text);
    let raw = client.invoke(&prompt).await?;
    let result = llm::parse_analysis(&raw)?;
    log::info!(
        "[PIPELINE] tone={} score={}/10 confidence={} replies={}",
        result.tone,
        result.score,
        result.confidence,
        result.replies.len()
    );
    Ok(result)
}
