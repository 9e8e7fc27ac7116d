//! Overthinkr: decode the subtext of a message.
//!
//! Typed text or a chat screenshot goes in; a tone label, a tension score,
//! a short verdict and three reply suggestions come out. The linguistic
//! judgment is Gemini's; this crate owns everything around it:
//!
//!   - text_source.rs  canonical input (typed or OCR)
//!   - ocr/            OCR engine seam + tesseract adapter + cleanup
//!   - llm/            prompt, Gemini client, response validation
//!   - session.rs      Idle / Processing / Success / Failure state
//!   - pipeline.rs     the driver that ties the stages to a session
//!   - config.rs       .env, settings file, API key (env or keychain)
//!
//! Presentation (icons, colours, clipboard) lives in the `overthinkr`
//! binary, not here.

pub mod config;
pub mod error;
pub mod llm;
pub mod ocr;
pub mod pipeline;
pub mod session;
pub mod text_source;

pub use config::{ConfigError, GeminiConfig, Settings};
pub use error::{AnalysisError, ErrorKind, ParseError};
pub use llm::{AnalysisResult, GeminiClient, ReplyKind, ReplyOption};
pub use pipeline::{Pipeline, Submission};
pub use session::{AnalysisSession, Phase, Rejected, RunGuard, SessionHandle};
pub use text_source::CanonicalText;

/// Process startup: load `.env.local` / `.env`, then initialise logging.
///
/// Logging is controlled by `RUST_LOG` (default: warnings only).
pub fn init() {
    let loaded = config::load_dotenv();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
    if let Some(path) = loaded {
        log::info!("[STARTUP] Loaded {}", path.display());
    }
}
