//! HTTP client for the labelling server
//!
//! One method per server endpoint, JSON in/out. The server owns the cursor,
//! the cleaned transcripts and the persisted corpus; this client only reads
//! windows/stats and posts accept/skip/undo intents.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from the labelling server, split the way the controller needs
/// to react to them: transport-ish failures leave state untouched, logical
/// failures are surfaced verbatim, exhaustion ends the session.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network-level failure (connect, timeout, read)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response without a recognizable error body
    #[error("server error {status}: {body}")]
    Http { status: u16, body: String },

    /// Server-reported rejection (`success: false` or an `error` body)
    #[error("{0}")]
    Logical(String),

    /// No more items to label (terminal, expected)
    #[error("no more items to label")]
    Exhausted,

    /// Response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True for failures that should leave the current window and
    /// selections intact so the user can retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ApiError::Exhausted)
    }
}

// ═══════════════════════════════════════════════════════════════
// WIRE TYPES - READS
// ═══════════════════════════════════════════════════════════════

/// The image-bearing message a context window is gathered around.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchorMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Opaque correlation key, passed back on save. Format is the server's.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub timestamp: Value,
}

/// A message surrounding the anchor, eligible for candidate filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub timestamp: Value,
}

/// One server-provided labelling batch: anchor plus surrounding messages.
/// Immutable once fetched; replaced wholesale on every reload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextWindow {
    pub image_message: AnchorMessage,
    #[serde(default)]
    pub preceding: Vec<ContextMessage>,
    #[serde(default)]
    pub following: Vec<ContextMessage>,
    #[serde(default)]
    pub current_index: Option<u64>,
    #[serde(default)]
    pub total_images: Option<u64>,
    #[serde(default)]
    pub unfiltered_idx: Option<u64>,
    #[serde(default)]
    pub total_unfiltered: Option<u64>,
}

/// Response of the load-more-before/after widening endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoreMessages {
    #[serde(default)]
    pub preceding: Vec<ContextMessage>,
    #[serde(default)]
    pub following: Vec<ContextMessage>,
    #[serde(default)]
    pub count: u64,
}

/// The message body of a next-message response (conversation mode).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// The `message` field doubles as a human-readable note on the final
/// `done: true` response, so it deserializes either way.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageField {
    Body(MessageBody),
    Note(String),
}

/// Next message to step through in conversation mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextMessage {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub message: Option<MessageField>,
    #[serde(default)]
    pub conversation_size: Option<u64>,
    #[serde(default)]
    pub labeled_count: Option<u64>,
    #[serde(default)]
    pub total_labeled: Option<u64>,
}

impl NextMessage {
    /// The actual message body, if this is not the terminal response.
    pub fn body(&self) -> Option<&MessageBody> {
        match &self.message {
            Some(MessageField::Body(b)) => Some(b),
            _ => None,
        }
    }
}

/// Aggregate progress counters. Server-owned; the client only ever holds
/// the last-fetched copy and treats it as stale-tolerant display data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub total_images: Option<u64>,
    #[serde(default)]
    pub total_messages: Option<u64>,
    #[serde(default)]
    pub labeled_messages: Option<u64>,
    #[serde(default)]
    pub labeled_conversations: u64,
    #[serde(default)]
    pub current_index: u64,
    #[serde(default)]
    pub progress_percent: Option<f64>,
}

impl Stats {
    /// Total item count regardless of mode.
    pub fn total(&self) -> Option<u64> {
        self.total_images.or(self.total_messages)
    }
}

// ═══════════════════════════════════════════════════════════════
// WIRE TYPES - WRITES
// ═══════════════════════════════════════════════════════════════

/// One part of a multi-part message in a training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Image { image: String },
}

impl ContentPart {
    pub fn text(s: impl Into<String>) -> Self {
        ContentPart::Text { text: s.into() }
    }

    pub fn image(s: impl Into<String>) -> Self {
        ContentPart::Image { image: s.into() }
    }
}

/// One turn of a training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

/// Body of the save-example endpoint. Message ordering is fixed: user text
/// turn, image turn, assistant text turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveExampleRequest {
    pub images: Vec<String>,
    pub messages: Vec<ExampleMessage>,
    /// Anchor correlation key so the server can reject a stale submission.
    #[serde(default)]
    pub timestamp: Value,
}

/// Acknowledgement shape shared by all write endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WriteAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub labeled_count: Option<u64>,
    #[serde(default)]
    pub current_index: Option<u64>,
    #[serde(default)]
    pub conversation_size: Option<u64>,
    #[serde(default)]
    pub undo_stack_size: Option<u64>,
}

// ═══════════════════════════════════════════════════════════════
// CLIENT
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the labelling server's JSON API.
#[derive(Debug, Clone)]
pub struct LabelClient {
    http: reqwest::Client,
    base: String,
}

impl LabelClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn get_value(&self, path: &str) -> Result<Value, ApiError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base, path))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ErrorBody>(&body) {
                return Err(ApiError::Logical(err.error));
            }
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// POST a write endpoint; `success: false` or an `error` body become
    /// `ApiError::Logical` with the server's message verbatim.
    async fn post_ack(&self, path: &str, body: Option<Value>) -> Result<WriteAck, ApiError> {
        let mut req = self
            .http
            .post(format!("{}{}", self.base, path))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if let Some(json) = body {
            req = req.json(&json);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ErrorBody>(&text) {
                return Err(ApiError::Logical(err.error));
            }
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: truncate(&text, 200),
            });
        }

        let ack: WriteAck = serde_json::from_str(&text)?;
        if !ack.success {
            let msg = ack
                .error
                .unwrap_or_else(|| "request rejected by server".to_string());
            return Err(ApiError::Logical(msg));
        }
        Ok(ack)
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Fetch the current image-anchored context window. An `error` body is
    /// the server's exhaustion signal, not a failure.
    pub async fn context_window(&self) -> Result<ContextWindow, ApiError> {
        let value = match self.get_value("/api/vlm/context-window").await {
            Ok(v) => v,
            Err(ApiError::Logical(_)) => return Err(ApiError::Exhausted),
            Err(e) => return Err(e),
        };
        if value.get("error").is_some() {
            return Err(ApiError::Exhausted);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch the next message to step through (conversation mode).
    pub async fn next_message(&self) -> Result<NextMessage, ApiError> {
        let value = match self.get_value("/api/next-message").await {
            Ok(v) => v,
            Err(ApiError::Logical(_)) => return Err(ApiError::Exhausted),
            Err(e) => return Err(e),
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch aggregate progress counters.
    pub async fn stats(&self) -> Result<Stats, ApiError> {
        let value = self.get_value("/api/stats").await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Widen the current window with earlier messages.
    pub async fn load_more_before(&self) -> Result<MoreMessages, ApiError> {
        let value = self.get_value("/api/vlm/load-more-before").await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Widen the current window with later messages.
    pub async fn load_more_after(&self) -> Result<MoreMessages, ApiError> {
        let value = self.get_value("/api/vlm/load-more-after").await?;
        Ok(serde_json::from_value(value)?)
    }

    // ── Writes (image mode) ────────────────────────────────────

    /// Persist one assembled training example.
    pub async fn save_example(&self, req: &SaveExampleRequest) -> Result<WriteAck, ApiError> {
        let body = serde_json::to_value(req)?;
        self.post_ack("/api/vlm/save-example", Some(body)).await
    }

    /// Skip the current image without saving.
    pub async fn skip_image(&self) -> Result<WriteAck, ApiError> {
        self.post_ack("/api/vlm/skip-image", None).await
    }

    /// Roll back the most recently saved example.
    pub async fn undo_example(&self) -> Result<WriteAck, ApiError> {
        self.post_ack("/api/vlm/undo", None).await
    }

    // ── Writes (conversation mode) ─────────────────────────────

    /// Add the current message to the in-progress conversation.
    pub async fn add_to_conversation(&self) -> Result<WriteAck, ApiError> {
        self.post_ack("/api/add-to-conversation", None).await
    }

    /// End and persist the in-progress conversation.
    pub async fn end_conversation(&self) -> Result<WriteAck, ApiError> {
        self.post_ack("/api/end-conversation", None).await
    }

    /// Undo the last message addition.
    pub async fn undo_message(&self) -> Result<WriteAck, ApiError> {
        self.post_ack("/api/undo", None).await
    }

    /// Skip the current message.
    pub async fn skip_message(&self) -> Result<WriteAck, ApiError> {
        self.post_ack("/api/skip-message", None).await
    }

    /// Check the server is reachable (for `doctor`).
    pub async fn check_connectivity(&self) -> Result<Stats> {
        self.stats()
            .await
            .with_context(|| format!("Failed to reach labelling server at {}", self.base))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
