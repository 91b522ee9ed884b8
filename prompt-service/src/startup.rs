//! Application startup and lifecycle management.

use crate::config::ServiceConfig;
use crate::services::providers::gemini::{GeminiChatProvider, GeminiConfig};
use crate::services::providers::ChatProvider;
use crate::services::{Database, JwtService, PromptService};
use crate::{build_router, AppState};
use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the Gemini provider.
    pub async fn build(config: ServiceConfig) -> Result<Self, AppError> {
        let provider: Arc<dyn ChatProvider> = Arc::new(GeminiChatProvider::new(GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.google.model.clone(),
        }));

        tracing::info!(model = %config.google.model, "Initialized Gemini chat provider");

        Self::build_with_provider(config, provider).await
    }

    /// Build the application with an explicit provider. Tests inject a mock
    /// here so no Gemini traffic leaves the process.
    pub async fn build_with_provider(
        config: ServiceConfig,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;

        db.run_migrations().await?;

        let jwt = JwtService::new(&config.auth);
        let prompt_service = PromptService::new(db.clone(), provider);
        let metrics = crate::services::metrics::init_metrics();
        let ip_rate_limiter = create_ip_rate_limiter(config.rate_limit.per_minute, 60);

        let state = AppState {
            config: config.clone(),
            db,
            jwt,
            prompt_service,
            metrics,
            ip_rate_limiter,
        };

        // Port 0 binds a random port for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "prompt-service listening");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        let app = build_router(self.state).await?;

        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }
}
