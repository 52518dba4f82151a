use std::path::Path;

use storage::Catalog;
use storage::repository::project::ProjectRepository;

use crate::traits::{DataImporter, ImportContext, ImportReport, read_source};
use crate::Result;

/// Loads the scanner's `projects.json` into the `projects` table.
pub struct CatalogImporter;

#[async_trait::async_trait]
impl DataImporter for CatalogImporter {
    async fn import(&self, source: &Path, context: &ImportContext) -> Result<ImportReport> {
        let db = context.database()?;

        let json = read_source(source).await?;
        let catalog = Catalog::from_json(&json)?;
        tracing::info!("Loaded {} projects from {}", catalog.len(), source.display());

        let synced = ProjectRepository::new(db.pool())
            .sync_catalog(&catalog)
            .await?;

        Ok(ImportReport {
            imported: synced as usize,
            ..ImportReport::default()
        })
    }
}
