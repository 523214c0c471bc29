//! Upstream generation backend trait and the Gemini implementation.
//!
//! A backend only moves bytes: it returns the raw status and body, and the
//! relay decides what they mean. Transport failures are the only errors here.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use trivia_common::ModelProfile;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {}", source_chain(.0))]
    Http(#[from] reqwest::Error),
    #[error("Upstream timed out after {0:?}")]
    Timeout(Duration),
}

/// `reqwest::Error` hides its cause in `Display`; walk the source chain so clients see it.
fn source_chain(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// Raw upstream answer, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, model: &ModelProfile, prompt: &str) -> Result<UpstreamReply, LlmError>;
    fn name(&self) -> &str;
}

// ── Request / envelope helpers ───────────────────────────────────────────────

/// `{contents, generationConfig?, systemInstruction?}` for one model profile.
pub fn build_request_body(model: &ModelProfile, prompt: &str) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }]
    });

    if model.has_generation_config() {
        let mut config = serde_json::Map::new();
        if let Some(t) = model.temperature {
            config.insert("temperature".into(), json!(t));
        }
        if let Some(max) = model.max_output_tokens {
            config.insert("maxOutputTokens".into(), json!(max));
        }
        if let Some(level) = &model.thinking_level {
            config.insert("thinkingConfig".into(), json!({ "thinkingLevel": level }));
        }
        body["generationConfig"] = Value::Object(config);
    }

    if let Some(sys) = &model.system_instruction {
        body["systemInstruction"] = json!({
            "parts": [{ "text": sys }]
        });
    }

    body
}

/// Text of the first candidate's first part, if the envelope has that shape.
pub fn candidate_text(envelope: &Value) -> Option<&str> {
    envelope["candidates"][0]["content"]["parts"][0]["text"].as_str()
}

/// `(promptTokenCount, candidatesTokenCount)`, zero when absent.
pub fn token_usage(envelope: &Value) -> (u64, u64) {
    let usage = &envelope["usageMetadata"];
    (
        usage["promptTokenCount"].as_u64().unwrap_or(0),
        usage["candidatesTokenCount"].as_u64().unwrap_or(0),
    )
}

// ── Google Gemini ─────────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub base_url: String,
    api_key: SecretString,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// Every upstream call made through this backend is bounded by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.into(), api_key, timeout, client })
    }

    /// Timeouts become `LlmError::Timeout`; anything else keeps its cause but loses the URL.
    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Http(err.without_url())
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, model: &ModelProfile, prompt: &str) -> Result<UpstreamReply, LlmError> {
        let body = build_request_body(model, prompt);

        // Key goes in a header so it never shows up in URLs or error messages.
        let resp = self.client
            .post(self.endpoint(&model.name))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        Ok(UpstreamReply { status, body: text })
    }

    fn name(&self) -> &str { "gemini" }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn thinking_profile() -> ModelProfile {
        ModelProfile {
            name: "gemini-3-pro-preview".to_string(),
            temperature: Some(1.0),
            max_output_tokens: None,
            thinking_level: Some("MEDIUM".to_string()),
            system_instruction: Some("JSON only.".to_string()),
        }
    }

    #[test]
    fn test_plain_profile_sends_only_contents() {
        let body = build_request_body(&ModelProfile::named("gemini-pro"), "Ask me something");
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "Ask me something"}]}]})
        );
    }

    #[test]
    fn test_thinking_profile_attaches_config_and_instruction() {
        let body = build_request_body(&thinking_profile(), "q");
        assert_eq!(body["generationConfig"]["temperature"], 1.0);
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingLevel"], "MEDIUM");
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "JSON only.");
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn test_max_output_tokens_only() {
        let mut profile = ModelProfile::named("gemini-1.5-flash");
        profile.max_output_tokens = Some(1024);
        let body = build_request_body(&profile, "q");
        assert_eq!(body["generationConfig"], json!({"maxOutputTokens": 1024}));
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_candidate_text_happy_path() {
        let env = json!({"candidates": [{"content": {"parts": [{"text": "{\"a\":1}"}]}}]});
        assert_eq!(candidate_text(&env), Some("{\"a\":1}"));
    }

    #[test]
    fn test_candidate_text_missing_shapes() {
        assert_eq!(candidate_text(&json!({})), None);
        assert_eq!(candidate_text(&json!({"candidates": []})), None);
        assert_eq!(candidate_text(&json!({"candidates": [{"finishReason": "SAFETY"}]})), None);
        assert_eq!(candidate_text(&json!({"candidates": [{"content": {"parts": []}}]})), None);
    }

    #[test]
    fn test_token_usage_defaults_to_zero() {
        assert_eq!(token_usage(&json!({})), (0, 0));
        let env = json!({"usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 40}});
        assert_eq!(token_usage(&env), (12, 40));
    }

    #[test]
    fn test_endpoint_keeps_key_out_of_url() {
        let b = GeminiBackend::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            SecretString::from("AIza-test".to_string()),
            Duration::from_secs(30),
        )
        .unwrap();
        let url = b.endpoint("gemini-pro");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert!(!url.contains("AIza"));
        assert_eq!(b.name(), "gemini");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let b = GeminiBackend::new(
            "http://127.0.0.1:9",
            SecretString::from("AIza-test".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = b.generate(&ModelProfile::named("gemini-pro"), "q").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
        let msg = err.to_string();
        assert!(!msg.contains("http://127.0.0.1:9"), "URL leaked: {msg}");
        // the cause is appended after the bare reqwest message
        assert!(msg.starts_with("HTTP error: error sending request: "), "no cause in: {msg}");
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let timeout = Duration::from_millis(300);
        let b = GeminiBackend::new(
            format!("http://{addr}/v1beta"),
            SecretString::from("AIza-test".to_string()),
            timeout,
        )
        .unwrap();

        let started = Instant::now();
        let err = b.generate(&ModelProfile::named("gemini-pro"), "q").await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(err, LlmError::Timeout(t) if t == timeout));
        assert_eq!(err.to_string(), "Upstream timed out after 300ms");
    }

    /// Read one HTTP/1.1 request (head + content-length body) off the socket.
    async fn read_request(sock: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let len = text[..head_end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_request_wire_format() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let raw = read_request(&mut sock).await;
            let reply = r#"{"candidates":[{"content":{"parts":[{"text":"{}"}]}}]}"#;
            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                reply.len(),
                reply
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            let _ = tx.send(raw);
        });

        let b = GeminiBackend::new(
            format!("http://{addr}/v1beta"),
            SecretString::from("SECRETKEY".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        let reply = b.generate(&ModelProfile::named("gemini-pro"), "hi").await.unwrap();
        assert_eq!(reply.status, 200);
        assert!(candidate_text(&serde_json::from_str(&reply.body).unwrap()).is_some());

        let raw = rx.await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let mut lines = head.lines();
        let request_line = lines.next().unwrap();
        assert_eq!(request_line, "POST /v1beta/models/gemini-pro:generateContent HTTP/1.1");
        assert!(!request_line.contains("SECRETKEY"));

        let api_key = lines
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("x-goog-api-key"))
            .map(|(_, v)| v.trim().to_string());
        assert_eq!(api_key.as_deref(), Some("SECRETKEY"));

        let sent: Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            sent,
            json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }
}
