//! Analysis session: the one piece of mutable state the pipeline drives.
//!
//! ```text
//!   Idle ──submit──▶ Processing ──ok──▶ Success(result)
//!                        │                  │
//!                        └──err──▶ Failure(error)
//!   Success / Failure ──submit──▶ Processing
//! ```
//!
//! A submit is refused while a run is in flight; it is never queued. Each
//! accepted submit gets a [`RunTicket`], and only the holder of the current
//! ticket may move the session out of `Processing`. The driver holds its
//! ticket in a [`RunGuard`]: a run dropped mid-flight lands in
//! `Failure(Cancelled)` instead of leaving the session stuck.

use crate::error::AnalysisError;
use crate::llm::AnalysisResult;
use crate::text_source::CanonicalText;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Processing,
    Success(AnalysisResult),
    Failure(AnalysisError),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Processing => "processing",
            Phase::Success(_) => "success",
            Phase::Failure(_) => "failure",
        }
    }
}

/// A submit that was blocked before any pipeline stage ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("An analysis is already running")]
    Busy,
    #[error("Nothing to analyze: input is empty")]
    EmptyInput,
}

/// Proof that the holder owns the in-flight run.
#[derive(Debug, PartialEq, Eq)]
pub struct RunTicket(u64);

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    phase: Phase,
    input_text: Option<CanonicalText>,
    run: u64,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            input_text: None,
            run: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn input_text(&self) -> Option<&CanonicalText> {
        self.input_text.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.phase {
            Phase::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match &self.phase {
            Phase::Failure(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Processing)
    }

    /// Enter `Processing`. The previous result or error is dropped.
    ///
    /// `input` is the canonical text for a typed submit, or `None` when the
    /// text still has to come from OCR; either way the old input is replaced.
    pub fn begin(&mut self, input: Option<CanonicalText>) -> Result<RunTicket, Rejected> {
        if self.is_processing() {
            log::warn!("[SESSION] Submit ignored: run {} still in flight", self.run);
            return Err(Rejected::Busy);
        }
        self.run += 1;
        self.phase = Phase::Processing;
        self.input_text = input;
        log::info!("[SESSION] Run {} started", self.run);
        Ok(RunTicket(self.run))
    }

    /// Record text acquired mid-run (OCR). Ignored for a stale ticket.
    pub fn set_input(&mut self, ticket: &RunTicket, text: CanonicalText) {
        if self.owns(ticket) {
            self.input_text = Some(text);
        }
    }

    /// Leave `Processing` with the pipeline's outcome.
    ///
    /// Returns `false` (and changes nothing) for a stale ticket.
    pub fn finish(
        &mut self,
        ticket: RunTicket,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        if !self.owns(&ticket) {
            log::warn!("[SESSION] Dropping outcome of stale run {}", ticket.0);
            return false;
        }
        self.phase = match outcome {
            Ok(result) => {
                log::info!("[SESSION] Run {} succeeded: tone={}", ticket.0, result.tone);
                Phase::Success(result)
            }
            Err(error) => {
                log::warn!("[SESSION] Run {} failed: {}", ticket.0, error);
                Phase::Failure(error)
            }
        };
        true
    }

    /// Leave `Processing` after an OCR-only run.
    ///
    /// Success goes back to `Idle` with the recognized text as input, ready
    /// to be reviewed and submitted.
    pub fn finish_scan(
        &mut self,
        ticket: RunTicket,
        outcome: Result<CanonicalText, AnalysisError>,
    ) -> bool {
        if !self.owns(&ticket) {
            return false;
        }
        match outcome {
            Ok(text) => {
                log::info!("[SESSION] Run {} scanned {} chars", ticket.0, text.as_str().len());
                self.input_text = Some(text);
                self.phase = Phase::Idle;
            }
            Err(error) => {
                log::warn!("[SESSION] Run {} scan failed: {}", ticket.0, error);
                self.phase = Phase::Failure(error);
            }
        }
        true
    }

    /// Leave `Processing` for a run that will never report back.
    pub fn abandon(&mut self, ticket: RunTicket) -> bool {
        if !self.owns(&ticket) {
            return false;
        }
        log::warn!("[SESSION] Run {} dropped before finishing", ticket.0);
        self.phase = Phase::Failure(AnalysisError::Cancelled);
        true
    }

    /// Back to `Idle`, clearing input and any result. Refused mid-run.
    pub fn reset(&mut self) -> Result<(), Rejected> {
        if self.is_processing() {
            return Err(Rejected::Busy);
        }
        self.phase = Phase::Idle;
        self.input_text = None;
        Ok(())
    }

    fn owns(&self, ticket: &RunTicket) -> bool {
        self.is_processing() && ticket.0 == self.run
    }
}

/// Shared handle to one session. Locks are never held across an await.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<Mutex<AnalysisSession>>);

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut AnalysisSession) -> R) -> R {
        f(&mut self.lock())
    }

    /// A copy of the current state, for rendering.
    pub fn snapshot(&self) -> AnalysisSession {
        self.lock().clone()
    }

    /// Take the `Processing` slot and arm a guard for it.
    pub fn begin(&self, input: Option<CanonicalText>) -> Result<RunGuard, Rejected> {
        let ticket = self.with(|s| s.begin(input))?;
        Ok(RunGuard {
            session: self.clone(),
            ticket: Some(ticket),
        })
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisSession> {
        // A panic elsewhere cannot leave the session half-written: every
        // mutation is a single assignment.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the ticket of an in-flight run. Dropped without [`RunGuard::disarm`],
/// it abandons the run.
#[derive(Debug)]
pub struct RunGuard {
    session: SessionHandle,
    ticket: Option<RunTicket>,
}

impl RunGuard {
    pub fn ticket(&self) -> Option<&RunTicket> {
        self.ticket.as_ref()
    }

    /// Hand the ticket back for `finish` / `finish_scan`.
    pub fn disarm(mut self) -> Option<RunTicket> {
        self.ticket.take()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.session.with(|s| s.abandon(ticket));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ReplyOption;

    fn result() -> AnalysisResult {
        AnalysisResult {
            tone: "Friendly".into(),
            score: 2,
            explanation: "Warm.".into(),
            confidence: 90,
            replies: vec![ReplyOption {
                kind: "Calm".into(),
                msg: "Thanks!".into(),
            }],
        }
    }

    fn text(s: &str) -> Option<CanonicalText> {
        Some(CanonicalText::new(s).unwrap())
    }

    #[test]
    fn starts_idle_and_empty() {
        let session = AnalysisSession::new();
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(session.input_text().is_none());
        assert!(session.result().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn submit_then_success() {
        let mut session = AnalysisSession::new();
        let ticket = session.begin(text("hi")).unwrap();
        assert!(session.is_processing());
        assert!(session.finish(ticket, Ok(result())));
        assert_eq!(session.result(), Some(&result()));
        assert_eq!(session.input_text().unwrap().as_str(), "hi");
    }

    #[test]
    fn second_submit_while_processing_is_busy() {
        let mut session = AnalysisSession::new();
        let _ticket = session.begin(text("one")).unwrap();
        assert_eq!(session.begin(text("two")), Err(Rejected::Busy));
        assert_eq!(session.input_text().unwrap().as_str(), "one");
    }

    #[test]
    fn resubmit_from_success_and_failure() {
        let mut session = AnalysisSession::new();
        let t = session.begin(text("a")).unwrap();
        session.finish(t, Err(AnalysisError::TransportFailure { status: 500 }));
        assert!(session.error().is_some());

        let t = session.begin(text("b")).unwrap();
        assert!(session.error().is_none(), "old error must be dropped");
        session.finish(t, Ok(result()));

        let _t = session.begin(text("c")).unwrap();
        assert!(session.result().is_none(), "old result must be dropped");
    }

    #[test]
    fn stale_ticket_cannot_finish() {
        let mut session = AnalysisSession::new();
        let first = session.begin(text("a")).unwrap();
        session.finish(RunTicket(first.0), Ok(result()));
        let _second = session.begin(text("b")).unwrap();
        assert!(!session.finish(first, Err(AnalysisError::EmptyInput)));
        assert!(session.is_processing());
    }

    #[test]
    fn image_submit_clears_input_until_ocr_lands() {
        let mut session = AnalysisSession::new();
        let t = session.begin(text("old")).unwrap();
        session.finish(t, Ok(result()));

        let t = session.begin(None).unwrap();
        assert!(session.input_text().is_none());
        session.set_input(&t, CanonicalText::new("from ocr").unwrap());
        assert_eq!(session.input_text().unwrap().as_str(), "from ocr");
    }

    #[test]
    fn scan_returns_to_idle_with_text() {
        let mut session = AnalysisSession::new();
        let t = session.begin(None).unwrap();
        session.finish_scan(t, Ok(CanonicalText::new("scanned").unwrap()));
        assert_eq!(session.phase(), &Phase::Idle);
        assert_eq!(session.input_text().unwrap().as_str(), "scanned");
    }

    #[test]
    fn reset_refused_mid_run() {
        let mut session = AnalysisSession::new();
        let t = session.begin(text("a")).unwrap();
        assert_eq!(session.reset(), Err(Rejected::Busy));
        session.finish(t, Ok(result()));
        session.reset().unwrap();
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(session.input_text().is_none());
    }

    #[test]
    fn dropped_guard_abandons_run() {
        let handle = SessionHandle::new();
        let guard = handle.begin(text("x")).unwrap();
        assert!(handle.snapshot().is_processing());
        drop(guard);

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.error(), Some(&AnalysisError::Cancelled));
        assert!(handle.begin(text("y")).is_ok());
    }

    #[test]
    fn disarmed_guard_leaves_run_to_finish() {
        let handle = SessionHandle::new();
        let guard = handle.begin(text("x")).unwrap();
        let ticket = guard.disarm().unwrap();
        assert!(handle.snapshot().is_processing());
        assert!(handle.with(|s| s.finish(ticket, Ok(result()))));
        assert_eq!(handle.snapshot().result(), Some(&result()));
    }

    #[test]
    fn abandon_ignores_stale_ticket() {
        let mut session = AnalysisSession::new();
        let first = session.begin(text("a")).unwrap();
        session.finish(RunTicket(first.0), Ok(result()));
        assert!(!session.abandon(first));
        assert_eq!(session.result(), Some(&result()));
    }

    #[test]
    fn handle_snapshot_is_detached() {
        let handle = SessionHandle::new();
        let before = handle.snapshot();
        let _ = handle.with(|s| s.begin(text("x")));
        assert_eq!(before.phase(), &Phase::Idle);
        assert!(handle.snapshot().is_processing());
    }
}
