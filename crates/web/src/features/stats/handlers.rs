use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use storage::dto::stats::AllStatsResponse;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Aggregates of every project and overall totals", body = AllStatsResponse),
        (status = 503, description = "Storage temporarily unavailable")
    ),
    tag = "stats"
)]
pub async fn get_all_stats(State(state): State<AppState>) -> Result<Response, WebError> {
    let response = services::get_all_stats(&state).await?;

    Ok(Json(response).into_response())
}
