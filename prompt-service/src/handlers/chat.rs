use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::chat::ChatRequest, middleware::AuthUser, utils::ValidatedJson, AppState,
};

/// Run one requirement-engineering turn
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Next structured turn", body = PromptReply),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 502, description = "Gemini call failed", body = ErrorResponse)
    ),
    tag = "Chat",
    security(("bearer_auth" = []))
)]
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reply = state
        .prompt_service
        .chat(&user.0.sub, &req.session_id, &req.user_input)
        .await?;

    Ok((StatusCode::OK, Json(reply)))
}
