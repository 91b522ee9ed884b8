//! Mock provider implementation for testing.

use super::{ChatProvider, ChatTurn, ProviderError};
use crate::models::{PromptReply, ReplyStatus};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock chat provider that returns a canned reply and records call counts.
pub struct MockChatProvider {
    reply: PromptReply,
    calls: AtomicUsize,
    fail: bool,
}

impl MockChatProvider {
    pub fn new(reply: PromptReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A provider that always answers with a fixed collecting-state question.
    pub fn collecting(question: &str) -> Self {
        Self::new(PromptReply {
            status: ReplyStatus::Collecting,
            question_text: question.to_string(),
            ui_elements: Vec::new(),
            final_prompt: String::new(),
        })
    }

    /// A provider that fails every call, for upstream-error paths.
    pub fn failing() -> Self {
        Self {
            reply: PromptReply {
                status: ReplyStatus::Collecting,
                question_text: String::new(),
                ui_elements: Vec::new(),
                final_prompt: String::new(),
            },
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn next_turn(&self, _history: &[ChatTurn]) -> Result<PromptReply, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::ApiError("mock failure".to_string()));
        }
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
