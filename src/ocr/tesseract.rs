//! Tesseract OCR via the `tesseract` command-line program.
//!
//! PNG bytes go in on stdin, recognized text comes out on stdout
//! (`tesseract stdin stdout -l <lang>`). No temp files.

use super::{OcrEngine, OcrOutput};
use crate::error::AnalysisError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Use `explicit` if given, otherwise look `tesseract` up on `PATH`.
    pub fn locate(explicit: Option<&Path>, language: &str) -> Result<Self, AnalysisError> {
        let binary = match explicit {
            Some(path) => path.to_path_buf(),
            None => which::which("tesseract").map_err(|e| {
                AnalysisError::OcrFailure(format!("tesseract not found on PATH: {}", e))
            })?,
        };
        log::info!("[OCR] Using {} (lang={})", binary.display(), language);
        Ok(Self::new(binary, language))
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
        ]
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, png_bytes: Vec<u8>) -> Result<OcrOutput, AnalysisError> {
        let start = std::time::Instant::now();

        let mut child = tokio::process::Command::new(&self.binary)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AnalysisError::OcrFailure(format!(
                    "failed to spawn {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AnalysisError::OcrFailure("no stdin for tesseract".to_string()))?;
        // An early exit (bad language, unreadable data) shows up here as a
        // broken pipe; the exit status and stderr below say why.
        let fed = stdin.write_all(&png_bytes).await;
        // Close stdin so tesseract sees EOF.
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AnalysisError::OcrFailure(format!("tesseract did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            log::error!("[OCR] tesseract exited with {}: {}", output.status, stderr);
            return Err(AnalysisError::OcrFailure(if stderr.is_empty() {
                format!("tesseract exited with {}", output.status)
            } else {
                format!("tesseract exited with {}: {}", output.status, stderr)
            }));
        }

        if let Err(e) = fed {
            log::error!("[OCR] Failed to feed image to tesseract: {}", e);
            return Err(AnalysisError::OcrFailure(format!("failed to feed image: {}", e)));
        }

        Ok(OcrOutput {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            latency_ms: start.elapsed().as_millis(),
        })
    }
}
