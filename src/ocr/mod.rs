//! OCR domain: screenshot in, raw text out.
//!
//! The recognizer itself is an external collaborator behind [`OcrEngine`].
//! The shipped engine drives the `tesseract` CLI (tesseract.rs); tests and
//! embedders can plug in their own.

pub mod cleanup;
pub mod tesseract;

use crate::error::AnalysisError;
use async_trait::async_trait;
use std::path::Path;

pub use tesseract::TesseractEngine;

/// Result of one recognition run.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub latency_ms: u128,
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize text in a PNG image. Any failure is an `OcrFailure`.
    async fn recognize(&self, png_bytes: Vec<u8>) -> Result<OcrOutput, AnalysisError>;
}

/// Read an image file of any supported format and re-encode it as PNG.
///
/// Decoding up front turns corrupt or unsupported files into a clear
/// `OcrFailure` before the engine is involved.
pub fn load_as_png(path: &Path) -> Result<Vec<u8>, AnalysisError> {
    let bytes = std::fs::read(path).map_err(|e| {
        AnalysisError::OcrFailure(format!("cannot read '{}': {}", path.display(), e))
    })?;
    let image = image::load_from_memory(&bytes).map_err(|e| {
        AnalysisError::OcrFailure(format!("'{}' is not a readable image: {}", path.display(), e))
    })?;

    let mut png_bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| AnalysisError::OcrFailure(format!("PNG encode failed: {}", e)))?;
    Ok(png_bytes)
}
