//! Text source adapter: typed text or a screenshot, normalized into one
//! [`CanonicalText`].

use crate::error::AnalysisError;
use crate::ocr::{self, OcrEngine};
use std::fmt;
use std::path::Path;

/// Trimmed, non-empty input text. The unit of work for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalText(String);

impl CanonicalText {
    /// Trim `raw`; whitespace-only input is rejected with `EmptyInput`.
    pub fn new(raw: &str) -> Result<Self, AnalysisError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Run OCR on an image file and normalize the recognized text.
///
/// Every failure (missing file, undecodable image, engine error, nothing
/// recognized) surfaces as `OcrFailure`. No retry, no caching.
pub async fn from_image(
    engine: &dyn OcrEngine,
    path: &Path,
) -> Result<CanonicalText, AnalysisError> {
    let start = std::time::Instant::now();

    let png_bytes = ocr::load_as_png(path)?;
    log::info!(
        "[OCR] Loaded {} ({} PNG bytes)",
        path.display(),
        png_bytes.len()
    );

    let output = engine.recognize(png_bytes).await?;
    let cleaned = ocr::cleanup::normalize(&output.text);
    log::info!(
        "[OCR] {}: {} chars raw, {} after cleanup, {}ms",
        engine.name(),
        output.text.chars().count(),
        cleaned.chars().count(),
        start.elapsed().as_millis()
    );

    CanonicalText::new(&cleaned)
        .map_err(|_| AnalysisError::OcrFailure("no text recognized in image".to_string()))
}
