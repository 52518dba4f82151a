use async_trait::async_trait;

use super::{StorageBackendKind, StoreSnapshot, VoteStore};
use crate::Database;
use crate::error::Result;
use crate::models::{NewVote, ProjectAggregate, UpsertOutcome, Vote, VoteTotals};
use crate::repository::{stats::StatsRepository, vote::VoteRepository};

/// SQLite-backed store: `votes` is the source of truth and `project_stats`
/// is refreshed inside every write transaction.
#[derive(Debug, Clone)]
pub struct RelationalStore {
    db: Database,
}

impl RelationalStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn open(database_url: &str) -> Result<Self> {
        let db = Database::new(database_url).await?;
        tracing::info!("Running database migrations");
        db.run_migrations().await?;
        Ok(Self::new(db))
    }
}

#[async_trait]
impl VoteStore for RelationalStore {
    fn kind(&self) -> StorageBackendKind {
        StorageBackendKind::Sqlite
    }

    fn database(&self) -> Option<&Database> {
        Some(&self.db)
    }

    async fn upsert(&self, vote: NewVote) -> Result<UpsertOutcome> {
        VoteRepository::new(self.db.pool()).upsert(&vote).await
    }

    async fn votes_for_project(&self, project_id: &str) -> Result<Vec<Vote>> {
        VoteRepository::new(self.db.pool())
            .find_by_project(project_id)
            .await
    }

    async fn votes_for_user(&self, username: &str) -> Result<Vec<Vote>> {
        VoteRepository::new(self.db.pool())
            .find_by_user(username)
            .await
    }

    async fn aggregate(&self, project_id: &str) -> Result<Option<ProjectAggregate>> {
        StatsRepository::new(self.db.pool()).find(project_id).await
    }

    async fn aggregates(&self) -> Result<Vec<ProjectAggregate>> {
        StatsRepository::new(self.db.pool()).list().await
    }

    async fn totals(&self) -> Result<VoteTotals> {
        VoteRepository::new(self.db.pool()).totals().await
    }

    async fn snapshot(&self) -> Result<StoreSnapshot> {
        let mut tx = self.db.pool().begin().await?;
        let votes = VoteRepository::list_in(&mut tx).await?;
        let aggregates = StatsRepository::list_in(&mut tx).await?;
        tx.commit().await?;

        Ok(StoreSnapshot { votes, aggregates })
    }

    async fn rebuild_all(&self) -> Result<u64> {
        StatsRepository::new(self.db.pool()).rebuild_all().await
    }
}
