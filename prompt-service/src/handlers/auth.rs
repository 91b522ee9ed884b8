use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{TokenRequest, TokenResponse},
    utils::ValidatedJson,
    AppState,
};

/// Issue a bearer token for a user id
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn issue_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.db.upsert_user(&req.user_id).await?;

    let access_token = state.jwt.generate_token(&user.id)?;

    tracing::info!(user_id = %user.id, "Access token issued");

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: state.jwt.expiry_seconds(),
        }),
    ))
}
