//! Gemini `generateContent` client for the tone analysis prompt.
//!
//! One request per analysis, no retry, no streaming:
//! - Request body is `{ contents: [ { parts: [ { text: <prompt> } ] } ] }`
//! - API key travels in the `x-goog-api-key` header
//! - Non-2xx status is a transport failure; the body is never parsed
//! - A 2xx body must carry `candidates[0].content.parts[0].text`,
//!   otherwise the envelope is malformed
//! - The inner text is returned as-is for the validator in parse.rs

use super::prompts::Prompt;
use super::transport::{HttpTransport, Transport};
use crate::config::GeminiConfig;
use crate::error::AnalysisError;
use serde_json::Value;
use std::sync::Arc;

/// USD per 1M (input, output) text tokens, paid tier, by model prefix.
/// Longer prefixes first so `-lite` is not priced as its parent.
const PRICE_PER_MILLION: &[(&str, f64, f64)] = &[
    ("gemini-2.0-flash-lite", 0.075, 0.30),
    ("gemini-2.0-flash", 0.10, 0.40),
    ("gemini-2.5-flash-lite", 0.10, 0.40),
    ("gemini-2.5-flash", 0.30, 2.50),
];

fn price_per_million(model: &str) -> Option<(f64, f64)> {
    PRICE_PER_MILLION
        .iter()
        .find(|(prefix, _, _)| model.starts_with(*prefix))
        .map(|&(_, input, output)| (input, output))
}

/// Analysis client bound to one configuration and one transport.
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    transport: Arc<dyn Transport>,
}

impl GeminiClient {
    /// Client using the real HTTP transport.
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(config: GeminiConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send `prompt` and return the raw analysis text from the envelope.
    pub async fn invoke(&self, prompt: &Prompt) -> Result<String, AnalysisError> {
        log::info!("[LLM] Provider: gemini");
        log::info!("[LLM] Model: {}", self.config.model);

        let start = std::time::Instant::now();
        let response = self
            .transport
            .post_json(
                &self.config.generate_url(),
                &self.config.api_key,
                &request_body(prompt),
            )
            .await?;
        log::info!("[LLM] API latency: {}ms", start.elapsed().as_millis());

        if !response.is_success() {
            log::error!("[LLM] Gemini API returned {}", response.status);
            return Err(AnalysisError::TransportFailure {
                status: response.status,
            });
        }

        let envelope: Value = serde_json::from_str(&response.body).map_err(|e| {
            log::warn!("[LLM] Response body is not JSON: {}", e);
            AnalysisError::MalformedEnvelope(format!("body is not JSON: {}", e))
        })?;

        log_usage(&self.config.model, &envelope);

        match extract_candidate_text(&envelope) {
            Some(text) => {
                log::info!("[LLM] Candidate text: {} chars", text.len());
                Ok(text.to_string())
            }
            None => {
                let detail = describe_bad_envelope(&envelope);
                log::warn!("[LLM] Unexpected envelope: {}", detail);
                Err(AnalysisError::MalformedEnvelope(detail))
            }
        }
    }
}

/// Request body for a single-turn, text-only `generateContent` call.
pub fn request_body(prompt: &Prompt) -> Value {
    serde_json::json!({
        "contents": [
            {
                "parts": [
                    {
                        "text": prompt.as_str()
                    }
                ]
            }
        ]
    })
}

/// Gemini format: candidates[0].content.parts[0].text
fn extract_candidate_text(envelope: &Value) -> Option<&str> {
    envelope
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Best-effort reason for a 2xx body without candidate text.
fn describe_bad_envelope(envelope: &Value) -> String {
    if let Some(reason) = envelope
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
    {
        return format!("prompt blocked: {}", reason);
    }
    if let Some(message) = envelope
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return format!("error payload: {}", message);
    }
    if let Some(reason) = envelope
        .pointer("/candidates/0/finishReason")
        .and_then(Value::as_str)
    {
        return format!("candidate without text (finishReason={})", reason);
    }
    "missing candidates[0].content.parts[0].text".to_string()
}

fn log_usage(model: &str, envelope: &Value) {
    let Some(usage) = envelope.get("usageMetadata") else {
        return;
    };
    let input_tokens = usage["promptTokenCount"].as_u64().unwrap_or(0);
    let output_tokens = usage["candidatesTokenCount"].as_u64().unwrap_or(0);
    if input_tokens == 0 && output_tokens == 0 {
        return;
    }
    log::info!("[LLM] Input tokens: {}", input_tokens);
    log::info!("[LLM] Output tokens: {}", output_tokens);
    match estimate_cost(model, input_tokens, output_tokens) {
        Some(cost) => log::info!("[LLM] Estimated cost ({} list price): ${:.6}", model, cost),
        None => log::info!("[LLM] No price on file for {}, cost not estimated", model),
    }
}

fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
    let (input_rate, output_rate) = price_per_million(model)?;
    Some((input_tokens as f64 * input_rate + output_tokens as f64 * output_rate) / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::transport::RawResponse;
    use crate::text_source::CanonicalText;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with a canned response and records what it was sent.
    struct Canned {
        response: Result<RawResponse, AnalysisError>,
        seen: Mutex<Vec<(String, String, Value)>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(RawResponse {
                    status,
                    body: body.to_string(),
                }),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn post_json(
            &self,
            url: &str,
            api_key: &str,
            body: &Value,
        ) -> Result<RawResponse, AnalysisError> {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), api_key.to_string(), body.clone()));
            self.response.clone()
        }
    }

    fn prompt() -> Prompt {
        crate::llm::prompts::build_prompt(&CanonicalText::new("k thanks.").unwrap())
    }

    fn client(transport: Arc<Canned>) -> GeminiClient {
        GeminiClient::with_transport(GeminiConfig::new("test-key"), transport)
    }

    fn envelope(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 80 }
        })
        .to_string()
    }

    #[tokio::test]
    async fn extracts_inner_text_unparsed() {
        let transport = Canned::new(200, &envelope("{\"tone\": \"x\"}"));
        let text = client(transport).invoke(&prompt()).await.unwrap();
        assert_eq!(text, "{\"tone\": \"x\"}");
    }

    #[tokio::test]
    async fn sends_prompt_as_sole_content() {
        let transport = Canned::new(200, &envelope("{}"));
        let p = prompt();
        client(transport.clone()).invoke(&p).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (url, key, body) = &seen[0];
        assert!(url.ends_with("/models/gemini-2.0-flash:generateContent"));
        assert_eq!(key, "test-key");
        assert_eq!(body, &json!({ "contents": [{ "parts": [{ "text": p.as_str() }] }] }));
    }

    #[tokio::test]
    async fn non_success_status_is_transport_failure() {
        for status in [400, 403, 429, 500, 503] {
            let transport = Canned::new(status, &envelope("{}"));
            let err = client(transport).invoke(&prompt()).await.unwrap_err();
            assert_eq!(err, AnalysisError::TransportFailure { status });
        }
    }

    #[tokio::test]
    async fn unexpected_shape_is_malformed_envelope() {
        let bodies = [
            r#"{"unexpected":"shape"}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":42}]}}]}"#,
            r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#,
            "<html>gateway</html>",
            "",
        ];
        for body in bodies {
            let err = client(Canned::new(200, body)).invoke(&prompt()).await.unwrap_err();
            assert!(
                matches!(err, AnalysisError::MalformedEnvelope(_)),
                "{body:?} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let transport = Arc::new(Canned {
            response: Err(AnalysisError::Unreachable("connection refused".into())),
            seen: Mutex::new(Vec::new()),
        });
        let err = client(transport).invoke(&prompt()).await.unwrap_err();
        assert_eq!(err, AnalysisError::Unreachable("connection refused".into()));
    }

    #[test]
    fn cost_estimate_follows_configured_model() {
        let flash = estimate_cost("gemini-2.0-flash", 1_000_000, 1_000_000).unwrap();
        assert!((flash - 0.50).abs() < 1e-9);

        let lite = estimate_cost("gemini-2.0-flash-lite-001", 1_000_000, 0).unwrap();
        assert!((lite - 0.075).abs() < 1e-9);

        let newer = estimate_cost("gemini-2.5-flash", 0, 1_000_000).unwrap();
        assert!((newer - 2.50).abs() < 1e-9);

        assert_eq!(estimate_cost("gemini-2.5-pro", 1_000, 1_000), None);
    }

    #[test]
    fn block_reason_is_reported() {
        let detail = describe_bad_envelope(&json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        assert!(detail.contains("SAFETY"));
    }
}
