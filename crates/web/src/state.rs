use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use axum::http::HeaderName;
use storage::error::{Result, StorageError};
use storage::repository::project::ProjectRepository;
use storage::{Catalog, LegacyMirror, VoteStore};

/// Shared, swappable view of the project catalog.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    path: Arc<PathBuf>,
    current: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    pub fn new(path: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            path: Arc::new(path.into()),
            current: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// Loads the catalog at `path`; a missing file yields an empty catalog.
    pub async fn load_or_empty(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let catalog = match Catalog::load(&path).await {
            Ok(catalog) => catalog,
            Err(StorageError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    "No project catalog at {}, serving without project metadata",
                    path.display()
                );
                Catalog::default()
            }
            Err(e) => return Err(e),
        };

        tracing::info!("Loaded {} catalog projects from {}", catalog.len(), path.display());

        Ok(Self::new(path, catalog))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Arc<Catalog> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, catalog: Catalog) {
        let catalog = Arc::new(catalog);
        match self.current.write() {
            Ok(mut guard) => *guard = catalog,
            Err(poisoned) => *poisoned.into_inner() = catalog,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VoteStore>,
    pub mirror: Arc<LegacyMirror>,
    pub catalog: CatalogHandle,
    pub identity_header: HeaderName,
}

impl AppState {
    /// Copies the current catalog into the `projects` table when the store is
    /// relational. Returns the number of rows written.
    pub async fn sync_catalog_table(&self) -> Result<u64> {
        let Some(db) = self.store.database() else {
            return Ok(0);
        };

        let catalog = self.catalog.current();
        let synced = ProjectRepository::new(db.pool())
            .sync_catalog(&catalog)
            .await?;

        tracing::info!("Synced {} catalog projects into the database", synced);

        Ok(synced)
    }
}
