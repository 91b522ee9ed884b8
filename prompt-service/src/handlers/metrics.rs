use axum::{extract::State, response::IntoResponse};

use crate::AppState;

/// Prometheus exposition endpoint
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus metrics in text exposition format")
    ),
    tag = "Observability"
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}
