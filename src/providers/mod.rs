//! Chat completion providers

mod openai_compat;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::Message;

pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider};

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The endpoint could not be reached or the request timed out.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered, but not with a usable reply.
    #[error("Invalid response: {0}")]
    Malformed(String),
}

impl CompletionError {
    pub fn is_transport(&self) -> bool {
        matches!(self, CompletionError::Transport(_))
    }
}

/// Something that turns a transcript into one assistant reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the whole transcript and return the reply text.
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError>;
}
