use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use storage::dto::admin::{CatalogReloadResponse, MirrorSyncResponse, RebuildStatsResponse};

use crate::error::WebError;
use crate::features::catalog;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/admin/stats/rebuild",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Aggregates recomputed from the votes", body = RebuildStatsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "admin"
)]
pub async fn rebuild_stats(State(state): State<AppState>) -> Result<Response, WebError> {
    let rebuilt_projects = services::rebuild_stats(&state).await?;

    Ok(Json(RebuildStatsResponse {
        success: true,
        rebuilt_projects,
        message: format!("Rebuilt statistics for {} projects", rebuilt_projects),
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/mirror/sync",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Legacy mirror files regenerated", body = MirrorSyncResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Mirror files could not be written")
    ),
    tag = "admin"
)]
pub async fn sync_mirror(State(state): State<AppState>) -> Result<Response, WebError> {
    let report = services::sync_mirror(&state).await?;

    Ok(Json(MirrorSyncResponse {
        success: true,
        projects: report.projects,
        users: report.users,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/catalog/reload",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Catalog reloaded from disk", body = CatalogReloadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Catalog file could not be read")
    ),
    tag = "admin"
)]
pub async fn reload_catalog(State(state): State<AppState>) -> Result<Response, WebError> {
    let projects = catalog::services::reload_catalog(&state).await?;

    Ok(Json(CatalogReloadResponse {
        success: true,
        projects,
    })
    .into_response())
}
