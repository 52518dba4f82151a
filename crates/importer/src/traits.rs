use std::path::Path;
use std::sync::Arc;

use storage::{Database, StorageBackendKind, VoteStore};

use crate::{ImporterError, Result};

pub struct ImportContext {
    pub store: Arc<dyn VoteStore>,
}

impl ImportContext {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    /// The relational database behind the store, for imports that only make
    /// sense there.
    pub fn database(&self) -> Result<&Database> {
        self.store.database().ok_or_else(|| {
            ImporterError::ImportError(format!(
                "This import needs the sqlite backend, the configured backend is {}",
                self.store.kind()
            ))
        })
    }

    /// Rebuilds the persisted aggregate cache. `None` for the flat-file
    /// backend, whose aggregates are derived from the votes on every load and
    /// never persisted.
    pub async fn rebuild_stats(&self) -> Result<Option<u64>> {
        if self.store.kind() == StorageBackendKind::FlatFile {
            return Ok(None);
        }

        Ok(Some(self.store.rebuild_all().await?))
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn skip(&mut self, warning: String) {
        self.skipped += 1;
        self.warnings.push(warning);
    }

    pub fn log_summary(&self, source: &Path) {
        for warning in &self.warnings {
            tracing::warn!("  {}", warning);
        }

        tracing::info!(
            "Imported {} record(s) from {}, skipped {}",
            self.imported,
            source.display(),
            self.skipped
        );
    }
}

#[async_trait::async_trait]
pub trait DataImporter: Send + Sync {
    async fn import(&self, source: &Path, context: &ImportContext) -> Result<ImportReport>;
}

pub(crate) async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImporterError::ReadError {
            path: path.to_path_buf(),
            source,
        })
}
