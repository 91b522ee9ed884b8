//! AI provider abstraction.
//!
//! A trait seam over the conversation backend so tests can swap Gemini for a
//! mock without touching the turn engine.

pub mod gemini;
pub mod mock;

use crate::models::PromptReply;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid reply: {0}")]
    InvalidReply(String),
}

/// One turn of conversation context sent to the provider.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// "user" or "model".
    pub role: String,
    pub content: String,
}

/// Trait for requirement-engineering chat providers (e.g., Gemini).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Produce the next structured turn given the full session history.
    ///
    /// The last element of `history` is the user input that triggered the
    /// call.
    async fn next_turn(&self, history: &[ChatTurn]) -> Result<PromptReply, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
