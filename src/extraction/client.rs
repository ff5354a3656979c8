//! OpenAI-compatible chat completion client.
//!
//! The router only sees the [`InferenceClient`] trait, so tests drive the
//! escalation machinery with a scripted mock while production uses
//! [`HttpInferenceClient`] over reqwest.

use crate::config::InferenceConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// Chat content is either a plain string or an array of typed parts. The
/// vision tier needs parts; serde's untagged enum keeps both shapes on one
/// field the way the upstream API does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessagePart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_data_uri(mime: &str, base64: &str) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{mime};base64,{base64}"),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// A single completed inference call, reduced to what routing and cost
/// accounting need.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

/// Upstream failure classes. The distinction between quota exhaustion and
/// ordinary rate limiting matters because only the latter is retryable by the
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Upstream rate limited")]
    RateLimited,
    #[error("Upstream credits exhausted")]
    CreditsExhausted,
    #[error("Upstream HTTP {status}: {detail}")]
    Http { status: u16, detail: String },
    #[error("Upstream request timed out")]
    Timeout,
    #[error("Upstream transport error: {0}")]
    Transport(String),
    #[error("Upstream response was not a chat completion")]
    Malformed,
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<Completion, InferenceError>;
}

/// Production client over an OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpInferenceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn complete(&self, request: ChatRequest) -> Result<Completion, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else {
                    InferenceError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => InferenceError::RateLimited,
                // OpenAI-compatible providers signal exhausted balance as 402
                // or as a 403 with a quota message.
                402 => InferenceError::CreditsExhausted,
                403 if detail.contains("quota") || detail.contains("credit") => {
                    InferenceError::CreditsExhausted
                }
                code => InferenceError::Http {
                    status: code,
                    detail: truncate(&detail, 300),
                },
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|_| InferenceError::Malformed)?;
        let choice = body.choices.into_iter().next().ok_or(InferenceError::Malformed)?;
        Ok(Completion {
            content: choice.message.content,
            tokens_in: body.usage.prompt_tokens,
            tokens_out: body.usage.completion_tokens,
        })
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_openai_shape() {
        let request = ChatRequest {
            model: "gpt-5-nano".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: MessageContent::Text("hi".into()),
            }],
            max_tokens: 300,
            stop: Some(vec!["###".into()]),
            temperature: 0.0,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["max_tokens"], 300);
        assert_eq!(value["stop"][0], "###");
    }

    #[test]
    fn test_stop_omitted_when_none() {
        let request = ChatRequest {
            model: "gpt-5".into(),
            messages: vec![],
            max_tokens: 500,
            stop: None,
            temperature: 0.0,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("stop").is_none());
    }

    #[test]
    fn test_response_parses_with_missing_usage() {
        let body = json!({
            "choices": [{ "message": { "content": "[]" } }]
        });
        let parsed: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "[]");
        assert_eq!(parsed.usage.prompt_tokens, 0);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "héllo wörld, this is a fairly long error body";
        let t = truncate(s, 10);
        assert!(t.ends_with("..."));
        assert!(t.len() <= 13);
    }
}
