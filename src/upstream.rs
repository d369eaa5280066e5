/// Upstream OpenAI-Compatible Client
///
/// One long-lived `reqwest::Client` bound to the configured base URL, bearer
/// key, and attribution headers. Two calls are exposed, matching the two
/// upstream API shapes the chat tool can select between:
/// - `chat_completions`: POST {base}/chat/completions
/// - `responses`: POST {base}/responses (hosted tools, e.g. web_search)
///
/// Response shapes are parsed into structs whose every field is optional;
/// callers decide which absences matter. No retries: a single upstream
/// failure surfaces immediately.

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::config::Settings;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Immutable handle for upstream calls: credentials and base URL only, no
/// per-call state, so concurrent requests share it without locking.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Build the client from configuration. Attribution headers follow the
    /// OpenRouter convention: HTTP-Referer identifies the calling app when a
    /// public URL is configured, X-Title carries the app title.
    pub fn from_config(settings: &Settings) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        if let Some(url) = &settings.app_public_url {
            headers.insert("HTTP-Referer", HeaderValue::from_str(url)?);
        }
        headers.insert("X-Title", HeaderValue::from_str(&settings.app_title)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST {base}/chat/completions.
    pub async fn chat_completions(
        &self,
        request: &CompletionRequest,
    ) -> Result<ChatCompletion, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// POST {base}/responses.
    pub async fn responses(
        &self,
        request: &ResponsesRequest,
    ) -> Result<ResponsesReply, UpstreamError> {
        let url = format!("{}/responses", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Chat Completions request body. Optional fields the caller did not supply
/// are omitted from the wire entirely, never sent as null.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_reasoning: Option<bool>,
}

/// Responses API request body. `input` carries the chat messages verbatim;
/// the role/content array is accepted by both API shapes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<Value>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Chat Completions response. Every field the gateway reads is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub id: Option<String>,
    pub object: Option<String>,
    pub created: Option<i64>,
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChoiceMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub role: Option<String>,
    pub content: Option<String>,
}

/// Responses API reply. Some compatible routers inline `output_text`; the
/// documented schema nests text under message-kind output items.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesReply {
    pub id: Option<String>,
    #[serde(default)]
    pub output: Vec<ResponseOutputItem>,
    pub output_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseOutputItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Vec<ResponseOutputContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseOutputContent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<String>,
}

impl ResponsesReply {
    /// Flattened assistant text: the inlined `output_text` when present,
    /// otherwise the concatenation of output_text content in message-kind
    /// output items. Trimmed; empty when the reply carries no text.
    pub fn flattened_text(&self) -> String {
        if let Some(text) = &self.output_text {
            return text.trim().to_string();
        }

        let mut flattened = String::new();
        for item in &self.output {
            if item.kind.as_deref() != Some("message") {
                continue;
            }
            for content in &item.content {
                if content.kind.as_deref() == Some("output_text") {
                    if let Some(text) = &content.text {
                        flattened.push_str(text);
                    }
                }
            }
        }
        flattened.trim().to_string()
    }
}
