//! Pluggable vote storage. Exactly one backend is chosen at startup from
//! configuration and used for the lifetime of the process.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Database;
use crate::error::{Result, StorageError};
use crate::mirror::LegacyMirror;
use crate::models::{NewVote, ProjectAggregate, UpsertOutcome, Vote, VoteTotals};

mod flat_file;
mod relational;

#[cfg(test)]
mod contract;

pub use flat_file::FlatFileStore;
pub use relational::RelationalStore;

/// Votes and aggregates read at one consistent point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub votes: Vec<Vote>,
    pub aggregates: Vec<ProjectAggregate>,
}

/// Authoritative store of votes and of the per-project aggregate cache.
///
/// Implementations guarantee that an upsert and the recomputation of the
/// affected aggregate become visible together or not at all.
#[async_trait]
pub trait VoteStore: Send + Sync {
    fn kind(&self) -> StorageBackendKind;

    /// The relational handle, when this store is backed by one.
    fn database(&self) -> Option<&Database> {
        None
    }

    async fn upsert(&self, vote: NewVote) -> Result<UpsertOutcome>;

    /// Validates raw client input, then upserts it.
    async fn upsert_vote(
        &self,
        username: &str,
        project_id: &str,
        raw_score: &Value,
    ) -> Result<UpsertOutcome> {
        let vote = NewVote::new(username, project_id, raw_score)?;
        self.upsert(vote).await
    }

    /// At most one vote per username.
    async fn votes_for_project(&self, project_id: &str) -> Result<Vec<Vote>>;

    /// Most recent first.
    async fn votes_for_user(&self, username: &str) -> Result<Vec<Vote>>;

    async fn aggregate(&self, project_id: &str) -> Result<Option<ProjectAggregate>>;

    /// Every cached aggregate, in dashboard order.
    async fn aggregates(&self) -> Result<Vec<ProjectAggregate>>;

    async fn totals(&self) -> Result<VoteTotals>;

    async fn snapshot(&self) -> Result<StoreSnapshot>;

    /// Discards cached aggregates and derives them again from the votes.
    /// Returns the number of projects with at least one vote.
    async fn rebuild_all(&self) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackendKind {
    #[default]
    Sqlite,
    FlatFile,
}

impl FromStr for StorageBackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "relational" => Ok(Self::Sqlite),
            "flat-file" | "flat_file" | "json" => Ok(Self::FlatFile),
            other => Err(StorageError::validation(format!(
                "Unknown storage backend '{}', expected 'sqlite' or 'flat-file'",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::FlatFile => write!(f, "flat-file"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub kind: StorageBackendKind,
    pub database_url: Option<String>,
    pub flat_file_path: PathBuf,
}

/// Opens the configured backend. For SQLite the schema migrations are applied.
pub async fn open(settings: &BackendSettings) -> Result<Arc<dyn VoteStore>> {
    match settings.kind {
        StorageBackendKind::Sqlite => {
            let url = settings.database_url.as_deref().ok_or_else(|| {
                StorageError::validation("DATABASE_URL is required for the sqlite backend")
            })?;
            let store = RelationalStore::open(url).await?;
            Ok(Arc::new(store))
        }
        StorageBackendKind::FlatFile => {
            let store = FlatFileStore::open(&settings.flat_file_path).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Refuses a flat-file store path that the legacy mirror would overwrite.
pub fn ensure_separate_from_mirror(
    settings: &BackendSettings,
    mirror: &LegacyMirror,
) -> Result<()> {
    if settings.kind == StorageBackendKind::FlatFile
        && mirror.writes_to(&settings.flat_file_path)
    {
        return Err(StorageError::validation(format!(
            "FLAT_FILE_PATH {} is a legacy mirror file in {}",
            settings.flat_file_path.display(),
            mirror.dir().display()
        )));
    }

    Ok(())
}
