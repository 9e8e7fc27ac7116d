//! Shared fakes for pipeline tests: a scripted Gemini endpoint and a
//! scripted OCR engine. Both count their calls.

#![allow(dead_code)]

use async_trait::async_trait;
use overthinkr_lib::llm::{GeminiClient, RawResponse, Transport};
use overthinkr_lib::ocr::{OcrEngine, OcrOutput};
use overthinkr_lib::{AnalysisError, GeminiConfig, Pipeline};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Gemini stand-in that answers every request with the same status + body,
/// or fails every request with the same error.
pub struct ScriptedTransport {
    status: u16,
    body: String,
    error: Option<AnalysisError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Self::delayed(status, body, Duration::ZERO)
    }

    /// Same, but each request takes `delay` to answer.
    pub fn delayed(status: u16, body: impl Into<String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            error: None,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    /// Every request fails before an HTTP status exists.
    pub fn unreachable(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            status: 0,
            body: String::new(),
            error: Some(AnalysisError::Unreachable(detail.to_string())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    /// 200 with a well-formed envelope around `inner`.
    pub fn answering(inner: &str) -> Arc<Self> {
        Self::new(200, envelope(inner))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(
        &self,
        _url: &str,
        _api_key: &str,
        _body: &serde_json::Value,
    ) -> Result<RawResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(RawResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// OCR stand-in: returns fixed text, or fails.
pub struct ScriptedOcr {
    text: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedOcr {
    pub fn reading(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, _png_bytes: Vec<u8>) -> Result<OcrOutput, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.text {
            Some(text) => Ok(OcrOutput {
                text: text.clone(),
                latency_ms: 1,
            }),
            None => Err(AnalysisError::OcrFailure("engine crashed".to_string())),
        }
    }
}

pub fn envelope(inner: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": inner }], "role": "model" } }]
    })
    .to_string()
}

pub fn pipeline(transport: Arc<ScriptedTransport>, ocr: Arc<ScriptedOcr>) -> Pipeline {
    let client = GeminiClient::with_transport(GeminiConfig::new("test-key"), transport);
    Pipeline::new(client, ocr)
}

/// Write a small white PNG and return its path.
pub fn screenshot(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("overthinkr-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    image::RgbImage::from_pixel(16, 8, image::Rgb([255, 255, 255]))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

pub const SCENARIO_A_PAYLOAD: &str = r#"{"tone":"Passive-aggressive","score":7,"explanation":"...","confidence":80,"replies":[{"type":"Confident","msg":"Got it."},{"type":"Calm","msg":"Sounds good."},{"type":"Witty","msg":"Noted, boss."}]}"#;
