use chrono::Utc;
use sqlx::SqlitePool;

use crate::catalog::Catalog;
use crate::error::{Result, StorageError};
use crate::models::ProjectRecord;

pub struct ProjectRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProjectRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: &str) -> Result<ProjectRecord> {
        let project = sqlx::query_as::<_, ProjectRecord>(
            r#"
            SELECT id, name, school, class, description
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(project)
    }

    /// Upserts every catalog project into the reference table. Projects that
    /// disappeared from the catalog are kept, since votes may still refer to them.
    pub async fn sync_catalog(&self, catalog: &Catalog) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut count = 0u64;

        for record in catalog.records() {
            sqlx::query(
                r#"
                INSERT INTO projects (id, name, school, class, description, last_updated)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (id)
                DO UPDATE SET
                    name = excluded.name,
                    school = excluded.school,
                    class = excluded.class,
                    description = excluded.description,
                    last_updated = excluded.last_updated
                "#,
            )
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.school)
            .bind(&record.class)
            .bind(&record.description)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            count += 1;
        }

        tx.commit().await?;

        Ok(count)
    }
}
