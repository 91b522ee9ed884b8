use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::chat::{HistoryResponse, ResetResponse, SessionListResponse, SessionRequest, SummaryResponse},
    middleware::AuthUser,
    models::session::is_valid_session_id,
    utils::ValidatedJson,
    AppState,
};

fn check_path_session_id(session_id: &str) -> Result<(), AppError> {
    if is_valid_session_id(session_id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(anyhow::anyhow!(
            "session_id must be non-empty and contain only [A-Za-z0-9_-]"
        )))
    }
}

/// List the caller's sessions
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Sessions for the authenticated user", body = SessionListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.prompt_service.sessions(&user.0.sub).await?;
    Ok((StatusCode::OK, Json(SessionListResponse { sessions })))
}

/// Full message history of a session
#[utoipa::path(
    get,
    path = "/history/{session_id}",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Messages in conversation order", body = HistoryResponse),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_path_session_id(&session_id)?;
    let messages = state.prompt_service.history(&user.0.sub, &session_id).await?;
    Ok((
        StatusCode::OK,
        Json(HistoryResponse {
            session_id,
            messages,
        }),
    ))
}

/// Delete a session's history
#[utoipa::path(
    post,
    path = "/reset",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Reset result; `reset` is false when nothing existed", body = ResetResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
pub async fn reset(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<SessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .prompt_service
        .reset(&user.0.sub, &req.session_id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(ResetResponse {
            session_id: req.session_id,
            reset: deleted,
        }),
    ))
}

/// The user's answers so far
#[utoipa::path(
    get,
    path = "/summary/{session_id}",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "User answers in conversation order", body = SummaryResponse),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_path_session_id(&session_id)?;
    let user_answers = state.prompt_service.summary(&user.0.sub, &session_id).await?;
    Ok((
        StatusCode::OK,
        Json(SummaryResponse {
            session_id,
            user_answers,
        }),
    ))
}
