//! Completion endpoint integrations

mod relay;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::Message;

pub use relay::{RelayClient, RelayConfig};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A text-completion backend. One call, one attempt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn send(
        &self,
        messages: &[Message],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, CompletionError>;
}
