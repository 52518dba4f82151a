use axum::{middleware, routing::post, Router};

use super::handlers::{rebuild_stats, reload_catalog, sync_mirror};
use crate::middleware::auth::{require_auth, ApiKeys};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/stats/rebuild", post(rebuild_stats))
        .route("/mirror/sync", post(sync_mirror))
        .route("/catalog/reload", post(reload_catalog))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
