use axum::{Json, extract::State};
use storage::dto::catalog::CatalogResponse;

use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/catalog",
    responses(
        (status = 200, description = "Projects grouped by school and class", body = CatalogResponse)
    ),
    tag = "catalog"
)]
pub async fn get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(services::get_catalog(&state))
}
