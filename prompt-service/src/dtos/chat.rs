use crate::models::{session::is_valid_session_id, Message, SessionSummary};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn validate_session_id(id: &str) -> Result<(), ValidationError> {
    if is_valid_session_id(id) {
        Ok(())
    } else {
        Err(ValidationError::new("session_id")
            .with_message("session_id must be non-empty and contain only [A-Za-z0-9_-]".into()))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChatRequest {
    #[validate(custom(function = validate_session_id))]
    #[schema(example = "session-1")]
    pub session_id: String,

    #[schema(example = "I want a prompt that writes release notes.")]
    pub user_input: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SessionRequest {
    #[validate(custom(function = validate_session_id))]
    #[schema(example = "session-1")]
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    pub session_id: String,
    pub reset: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub session_id: String,
    pub user_answers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_rejects_unsafe_session_id() {
        let req = ChatRequest {
            session_id: "../escape".to_string(),
            user_input: "hi".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn chat_request_accepts_safe_session_id() {
        let req = ChatRequest {
            session_id: "sess_01".to_string(),
            user_input: "hi".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
