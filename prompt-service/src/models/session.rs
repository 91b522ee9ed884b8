use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A chat session owned by a single user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session listing row, including the message count for the sidebar view.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
}

/// Session ids double as external identifiers; restrict them to the safe
/// alphabet the rest of the system assumes.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_safe_ids() {
        assert!(is_valid_session_id("abc-123_XYZ"));
        assert!(is_valid_session_id("a"));
    }

    #[test]
    fn rejects_empty_and_unsafe_ids() {
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../etc/passwd"));
        assert!(!is_valid_session_id("id with spaces"));
        assert!(!is_valid_session_id("sess;drop"));
    }
}
