use std::sync::Arc;

use axum::http::HeaderName;
use storage::backend::{FlatFileStore, RelationalStore};
use storage::{Catalog, Database, LegacyMirror, VoteStore};
use tempfile::TempDir;

use crate::config::DEFAULT_IDENTITY_HEADER;
use crate::state::{AppState, CatalogHandle};

pub const CATALOG: &str = r#"{
    "liceoX": {
        "3A": [
            {"id": "liceoX_3A_progettoY", "name": "Progetto Y", "authors": ["Anna"]},
            {"id": "liceoX_3A_progettoZ", "name": "Progetto Z"}
        ]
    },
    "itisW": {
        "5B": [
            {"id": "itisW_5B_avventura", "name": "Avventura"}
        ]
    }
}"#;

fn state(dir: &TempDir, store: Arc<dyn VoteStore>) -> AppState {
    let catalog_path = dir.path().join("projects.json");
    let catalog = Catalog::from_json(CATALOG).unwrap();

    AppState {
        store,
        mirror: Arc::new(LegacyMirror::new(dir.path().join("mirror"))),
        catalog: CatalogHandle::new(catalog_path, catalog),
        identity_header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
    }
}

pub async fn relational_state() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    db.run_migrations().await.unwrap();

    let state = state(&dir, Arc::new(RelationalStore::new(db)));
    state.sync_catalog_table().await.unwrap();

    (dir, state)
}

pub async fn flat_file_state() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let store = FlatFileStore::open(dir.path().join("ratings.json"))
        .await
        .unwrap();

    let state = state(&dir, Arc::new(store));
    (dir, state)
}
