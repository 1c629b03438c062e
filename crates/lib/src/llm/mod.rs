//! Completion endpoint abstraction and OpenAI-compatible client.
//!
//! The orchestrator only needs "send the transcript, get reply text back"; [`CompletionBackend`] is that seam.

mod openai;

use async_trait::async_trait;

use crate::transcript::TranscriptEntry;

pub use openai::OpenAiClient;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {0}")]
    Api(String),
    #[error("completion response had no choices")]
    EmptyResponse,
}

/// A hosted language model that turns a transcript into reply text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the full transcript and return the raw reply text. No retry is applied.
    async fn complete(&self, model: &str, entries: &[TranscriptEntry]) -> Result<String, LlmError>;
}
