pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, rate_limit::ip_rate_limit_middleware,
    rate_limit::IpRateLimiter, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::{
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::SecurityScheme,
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServiceConfig;
use crate::services::{Database, JwtService, PromptService};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::issue_token,
        handlers::chat::chat,
        handlers::session::list_sessions,
        handlers::session::history,
        handlers::session::reset,
        handlers::session::summary,
        handlers::metrics::metrics,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::TokenRequest,
            dtos::auth::TokenResponse,
            dtos::chat::ChatRequest,
            dtos::chat::SessionRequest,
            dtos::chat::SessionListResponse,
            dtos::chat::HistoryResponse,
            dtos::chat::ResetResponse,
            dtos::chat::SummaryResponse,
            models::PromptReply,
            models::ReplyStatus,
            models::UiElement,
            models::UiElementKind,
            models::Message,
            models::Role,
            models::SessionSummary,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Bearer token issuance"),
        (name = "Chat", description = "Requirement-engineering conversation"),
        (name = "Sessions", description = "Session history and lifecycle"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub prompt_service: PromptService,
    pub metrics: PrometheusHandle,
    pub ip_rate_limiter: IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Conversational endpoints sit behind the bearer-token middleware.
    let protected = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/history/:session_id", get(handlers::session::history))
        .route("/reset", post(handlers::session::reset))
        .route("/summary/:session_id", get(handlers::session::summary))
        .layer(from_fn_with_state(
            state.jwt.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/auth/token", post(handlers::auth::issue_token));

    // `/docs` doubles as the deployment smoke test, so it stays on by default.
    if state.config.swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let cors = build_cors_layer(&state.config)?;
    let ip_limiter = state.ip_rate_limiter.clone();

    let app = app
        .merge(protected)
        .with_state(state)
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware));

    Ok(app.layer(cors))
}

fn build_cors_layer(config: &ServiceConfig) -> Result<CorsLayer, AppError> {
    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::OPTIONS,
    ];
    let headers = [
        axum::http::header::AUTHORIZATION,
        axum::http::header::CONTENT_TYPE,
    ];

    // The original deployment allowed any origin; keep that as the default.
    if config.security.allowed_origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(methods)
            .allow_headers(headers));
    }

    let origins = config
        .security
        .allowed_origins
        .iter()
        .map(|o| {
            o.parse::<axum::http::HeaderValue>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers))
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.db.health_check().await {
        Ok(_) => Ok(Json(serde_json::json!({
            "status": "ok",
            "service": state.config.service_name,
            "version": env!("CARGO_PKG_VERSION")
        }))),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "service": state.config.service_name,
                    "error": e.to_string()
                })),
            ))
        }
    }
}
