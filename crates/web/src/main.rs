use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderName;
use storage::LegacyMirror;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use config::Config;
use middleware::auth::ApiKeys;
use state::{AppState, CatalogHandle};

#[derive(OpenApi)]
#[openapi(
    paths(
        features::votes::handlers::submit_vote,
        features::votes::handlers::get_vote_stats,
        features::votes::handlers::get_user_votes,
        features::stats::handlers::get_all_stats,
        features::catalog::handlers::get_catalog,
        features::admin::handlers::rebuild_stats,
        features::admin::handlers::sync_mirror,
        features::admin::handlers::reload_catalog,
    ),
    components(
        schemas(
            storage::dto::vote::SubmitVoteRequest,
            storage::dto::vote::SubmitVoteResponse,
            storage::dto::vote::UserVoteEntry,
            storage::dto::vote::UserVotesResponse,
            storage::dto::stats::ProjectStats,
            storage::dto::stats::ProjectStatsResponse,
            storage::dto::stats::AllStatsResponse,
            storage::dto::catalog::CatalogResponse,
            storage::dto::admin::RebuildStatsResponse,
            storage::dto::admin::MirrorSyncResponse,
            storage::dto::admin::CatalogReloadResponse,
            storage::catalog::CatalogEntry,
            storage::models::ProjectAggregate,
            storage::models::VoteTotals,
            storage::models::Vote,
        )
    ),
    tags(
        (name = "votes", description = "Vote submission and per-project ratings"),
        (name = "stats", description = "Dashboard statistics"),
        (name = "catalog", description = "Project catalog"),
        (name = "admin", description = "Maintenance endpoints (API key required)"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Twine rating service");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let identity_header = HeaderName::try_from(config.identity_header.as_str())
        .context("IDENTITY_HEADER is not a valid header name")?;

    let mirror = Arc::new(LegacyMirror::new(&config.mirror_dir));
    storage::backend::ensure_separate_from_mirror(&config.backend, &mirror)
        .context("Invalid storage configuration")?;

    tracing::info!("Opening {} vote store", config.backend.kind);
    let store = storage::backend::open(&config.backend)
        .await
        .context("Failed to open vote store")?;
    tracing::info!("Vote store ready");

    let catalog = CatalogHandle::load_or_empty(&config.catalog_path)
        .await
        .context("Failed to load project catalog")?;

    let state = AppState {
        store,
        mirror,
        catalog,
        identity_header,
    };

    state
        .sync_catalog_table()
        .await
        .context("Failed to sync catalog into the database")?;

    if let Err(e) = state.mirror.sync(state.store.as_ref()).await {
        tracing::warn!("Initial legacy mirror sync failed: {}", e);
    }

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, admin endpoints will reject every request");
    }

    if let Some(dir) = &config.projects_dir {
        tracing::info!("Serving project files from {} under /progetti", dir.display());
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = routes::router(state, api_keys, config.projects_dir.as_deref())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, app).await?;

    Ok(())
}
