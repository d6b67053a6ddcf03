//! Completion relay client
//!
//! The relay accepts a chat-completions style body and forwards it to the hosted
//! model, so no API key is held here.
//!
//! Request:
//!
//! ```json
//! { "messages": [{ "role": "user", "content": "..." }], "max_tokens": 1500, "temperature": 0.7 }
//! ```
//!
//! Response: `choices[0].message.content` carries the assistant text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};

use super::{CompletionClient, CompletionError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Full URL the request body is POSTed to
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8787".to_string(),
            timeout_secs: 60,
        }
    }
}

pub struct RelayClient {
    config: RelayConfig,
    client: Client,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl CompletionClient for RelayClient {
    async fn send(
        &self,
        messages: &[Message],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let request = ChatCompletionRequest {
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens,
            temperature,
        };

        tracing::debug!(
            "Sending {} message(s) to relay at {}",
            request.messages.len(),
            self.config.url
        );

        let response = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            CompletionError::InvalidResponse(format!("Failed to parse response: {} - Body: {}", e, body))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("No content in response".to_string()))
    }
}
