use storage::{Catalog, dto::catalog::CatalogResponse};

use crate::error::WebResult;
use crate::state::AppState;

pub fn get_catalog(state: &AppState) -> CatalogResponse {
    let catalog = state.catalog.current();

    CatalogResponse {
        success: true,
        total_projects: catalog.len(),
        schools: catalog.tree().clone(),
    }
}

/// Re-reads the catalog file and swaps it in. The previous catalog stays in
/// place when the file cannot be read.
pub async fn reload_catalog(state: &AppState) -> WebResult<usize> {
    let catalog = Catalog::load(state.catalog.path()).await?;
    let projects = catalog.len();

    state.catalog.replace(catalog);
    state.sync_catalog_table().await?;

    tracing::info!(
        "Reloaded {} catalog projects from {}",
        projects,
        state.catalog.path().display()
    );

    Ok(projects)
}
