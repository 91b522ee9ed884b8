//! The conversation turn engine.
//!
//! Owns the chat flow: session resolution, history assembly, the provider
//! call, and atomic persistence of the exchange.

use crate::models::{Message, PromptReply, ReplyStatus, Role, SessionSummary};
use crate::services::providers::{ChatProvider, ChatTurn, ProviderError};
use crate::services::Database;
use metrics::counter;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct PromptService {
    db: Database,
    provider: Arc<dyn ChatProvider>,
}

impl PromptService {
    pub fn new(db: Database, provider: Arc<dyn ChatProvider>) -> Self {
        Self { db, provider }
    }

    /// Run one conversation turn.
    ///
    /// The session row is created up front, but the exchange is only
    /// persisted once the provider call succeeds: a failed turn leaves the
    /// session empty and a retry replays the same turn.
    #[instrument(skip(self, user_input), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn chat(
        &self,
        user_id: &str,
        session_id: &str,
        user_input: &str,
    ) -> Result<PromptReply, AppError> {
        let session = self.db.find_or_create_session(user_id, session_id).await?;

        let stored = self.db.list_messages(&session.id).await?;
        let mut history: Vec<ChatTurn> = stored
            .into_iter()
            .map(|m| ChatTurn {
                role: m.role,
                content: m.content,
            })
            .collect();
        history.push(ChatTurn {
            role: Role::User.as_str().to_string(),
            content: user_input.to_string(),
        });

        let reply = self
            .provider
            .next_turn(&history)
            .await
            .map_err(map_provider_error)?;

        let model_content = serde_json::to_string(&reply).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to serialize reply: {}", e))
        })?;

        self.db
            .append_exchange(&session.id, user_input, &model_content)
            .await?;

        counter!("prompt_chat_turns_total").increment(1);
        if reply.status == ReplyStatus::Delivered {
            counter!("prompt_prompts_delivered_total").increment(1);
        }

        Ok(reply)
    }

    /// The caller's sessions, newest activity first.
    pub async fn sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, AppError> {
        self.db.list_sessions(user_id).await
    }

    /// Messages of a session in order. A session that does not exist for this
    /// user has an empty history.
    pub async fn history(&self, user_id: &str, session_id: &str) -> Result<Vec<Message>, AppError> {
        match self.db.get_owned_session(user_id, session_id).await? {
            Some(session) => self.db.list_messages(&session.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Delete a session and its messages. Returns false when nothing existed
    /// for this user.
    pub async fn reset(&self, user_id: &str, session_id: &str) -> Result<bool, AppError> {
        let deleted = self.db.delete_session(user_id, session_id).await?;
        if deleted {
            counter!("prompt_sessions_reset_total").increment(1);
        }
        Ok(deleted)
    }

    /// The user's answers so far, in conversation order.
    pub async fn summary(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let messages = self.history(user_id, session_id).await?;
        Ok(messages
            .into_iter()
            .filter(|m| m.is_user())
            .map(|m| m.content)
            .collect())
    }
}

fn map_provider_error(err: ProviderError) -> AppError {
    match err {
        ProviderError::NotConfigured(msg) => {
            AppError::ConfigError(anyhow::anyhow!("Gemini provider not configured: {}", msg))
        }
        other => AppError::BadGateway(format!("Gemini call failed: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_bad_gateway() {
        let err = map_provider_error(ProviderError::RateLimited);
        assert!(matches!(err, AppError::BadGateway(_)));

        let err = map_provider_error(ProviderError::ApiError("boom".to_string()));
        assert!(matches!(err, AppError::BadGateway(_)));
    }

    #[test]
    fn missing_configuration_maps_to_config_error() {
        let err = map_provider_error(ProviderError::NotConfigured("no key".to_string()));
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
