// Chat client for the local model that drafts itineraries

use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Model server returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid JSON from model server: {0}")]
    InvalidResponse(String),

    #[error("No assistant content found in response: {0}")]
    MissingContent(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync + 'static {
    // Send one system + user exchange and return the assistant text
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    stream: bool,
}

/// Client for an Ollama server's `/api/chat` endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OllamaClient {
    // No request timeout here; the planner bounds the whole call
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| LlmError::Network(err.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
            stream: false,
        };

        let endpoint = self.endpoint();
        debug!(%endpoint, model = %self.config.model, "Calling model server");
        let response = self
            .http
            .post(&endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| LlmError::Network(format!("failed to reach {}: {}", endpoint, err)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| LlmError::Network(err.to_string()))?;
        if status != reqwest::StatusCode::OK {
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let data = parse_chat_body(&body)?;
        extract_assistant_content(&data).ok_or_else(|| LlmError::MissingContent(data.to_string()))
    }
}

/// Parses a chat response body. A body that is not a single JSON document is
/// read as streamed NDJSON and the last parseable line wins.
pub fn parse_chat_body(body: &str) -> Result<Value, LlmError> {
    if let Ok(data) = serde_json::from_str::<Value>(body) {
        return Ok(data);
    }

    let text = body.replace("} {", "}\n{");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .rev()
        .find_map(|line| serde_json::from_str::<Value>(line).ok())
        .ok_or_else(|| LlmError::InvalidResponse(body.to_string()))
}

/// Assistant text from `message.content`, or from the last assistant entry
/// of a `messages` list.
pub fn extract_assistant_content(data: &Value) -> Option<String> {
    let non_empty = |value: &Value| {
        value
            .as_str()
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    };

    if let Some(content) = data
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(non_empty)
    {
        return Some(content);
    }

    data.get("messages")?
        .as_array()?
        .iter()
        .rev()
        .filter(|entry| entry.get("role").and_then(Value::as_str) == Some("assistant"))
        .find_map(|entry| entry.get("content").and_then(non_empty))
}
