//! Database service for prompt-service.

use crate::models::{ChatSession, Message, Role, SessionSummary, User};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "prompt-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Create a pool without connecting eagerly. Used by router-level tests
    /// that never reach the database.
    pub fn new_lazy(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(database_url)
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Invalid database URL: {}", e)))?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    /// Create the user row if it does not exist yet and return it.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn upsert_user(&self, user_id: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id)
            VALUES ($1)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING id, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert user: {}", e)))?;

        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Session Operations
    // -------------------------------------------------------------------------

    /// Look up a session and enforce ownership. Another user's session id is
    /// indistinguishable from a missing one.
    #[instrument(skip(self), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn get_owned_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        let session = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM chat_sessions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get session: {}", e)))?;

        Ok(session)
    }

    /// Fetch the caller's session, creating it on first use.
    ///
    /// Returns `NotFound` when the id already belongs to a different user.
    #[instrument(skip(self), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn find_or_create_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<ChatSession, AppError> {
        if let Some(session) = self.get_owned_session(user_id, session_id).await? {
            return Ok(session);
        }

        let created = sqlx::query_as::<_, ChatSession>(
            r#"
            INSERT INTO chat_sessions (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create session: {}", e)))?;

        match created {
            Some(session) => {
                info!(session_id = %session.id, "Session created");
                Ok(session)
            }
            // Insert lost a race or the id belongs to someone else.
            None => self
                .get_owned_session(user_id, session_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("Session '{}' not found", session_id))
                }),
        }
    }

    /// List the caller's sessions, newest activity first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, AppError> {
        let sessions = sqlx::query_as::<_, SessionSummary>(
            r#"
            SELECT s.id, s.title, s.created_at, s.updated_at,
                   COUNT(m.id) AS message_count
            FROM chat_sessions s
            LEFT JOIN messages m ON m.session_id = s.id
            WHERE s.user_id = $1
            GROUP BY s.id, s.title, s.created_at, s.updated_at
            ORDER BY s.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list sessions: {}", e)))?;

        Ok(sessions)
    }

    /// Delete a session (messages cascade). Returns false when nothing existed.
    #[instrument(skip(self), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn delete_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_sessions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete session: {}", e)))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(session_id = %session_id, "Session deleted");
        }
        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Message Operations
    // -------------------------------------------------------------------------

    /// Messages of a session in conversation order. Both turns of an exchange
    /// share a `created_at`, so ordering goes by the insert sequence.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, session_id, role, content, created_at
            FROM messages
            WHERE session_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list messages: {}", e)))?;

        Ok(messages)
    }

    /// Persist a user turn and the model's reply atomically, bumping the
    /// session's `updated_at`.
    #[instrument(skip(self, user_input, model_content), fields(session_id = %session_id))]
    pub async fn append_exchange(
        &self,
        session_id: &str,
        user_input: &str,
        model_content: &str,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, session_id, role, content)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(Role::User.as_str())
        .bind(user_input)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to save user message: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, session_id, role, content)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(Role::Model.as_str())
        .bind(model_content)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to save model message: {}", e))
        })?;

        sqlx::query(
            r#"
            UPDATE chat_sessions SET updated_at = now() WHERE id = $1
            "#,
        )
        .bind(session_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to touch session: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit exchange: {}", e))
        })?;

        Ok(())
    }
}
