//! LLM domain: tone analysis through Gemini.
//!
//!   - prompts.rs   deterministic prompt + schema constants
//!   - gemini.rs    generateContent client, envelope classification
//!   - transport.rs HTTP seam (reqwest in production)
//!   - parse.rs     validator for the analysis payload
//!   - types.rs     AnalysisResult / ReplyOption

pub mod gemini;
pub mod parse;
pub mod prompts;
pub mod transport;
pub mod types;

pub use gemini::GeminiClient;
pub use parse::parse_analysis;
pub use prompts::{build_prompt, Prompt};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use types::{AnalysisResult, ReplyKind, ReplyOption};
