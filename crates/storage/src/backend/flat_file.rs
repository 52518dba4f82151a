use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{StorageBackendKind, StoreSnapshot, VoteStore};
use crate::atomic;
use crate::error::{Result, StorageError};
use crate::models::{NewVote, ProjectAggregate, Score, UpsertOutcome, Vote, VoteTotals};
use crate::services::aggregate;

/// On-disk layout of the flat-file store.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlatDocument {
    votes: Vec<StoredVote>,
}

/// Shapes accepted when loading. The legacy `username -> project_id -> score`
/// mapping is converted on load and written back as a [`FlatDocument`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Document(FlatDocument),
    Legacy(BTreeMap<String, BTreeMap<String, Value>>),
}

impl OnDisk {
    fn into_document(self) -> FlatDocument {
        match self {
            Self::Document(document) => document,
            Self::Legacy(users) => {
                tracing::info!("Converting legacy username -> project vote mapping");
                FlatDocument {
                    votes: users
                        .into_iter()
                        .flat_map(|(username, projects)| {
                            projects.into_iter().map(move |(project_id, score)| StoredVote {
                                username: username.clone(),
                                project_id,
                                score,
                                timestamp: None,
                            })
                        })
                        .collect(),
                }
            }
        }
    }
}

fn parse_document(json: &str) -> Result<FlatDocument> {
    let value: Value = serde_json::from_str(json)?;
    let on_disk = OnDisk::deserialize(value).map_err(|_| {
        StorageError::validation("Vote file has an unrecognized layout")
    })?;
    Ok(on_disk.into_document())
}

/// Scores are kept as raw JSON so hand-edited or legacy files with invalid
/// values still load; those records are skipped rather than trusted.
#[derive(Debug, Serialize, Deserialize)]
struct StoredVote {
    username: String,
    project_id: String,
    score: Value,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

type VoteKey = (String, String);

#[derive(Debug, Default)]
struct FlatState {
    votes: BTreeMap<VoteKey, Vote>,
    aggregates: BTreeMap<String, ProjectAggregate>,
}

impl FlatState {
    fn from_document(document: FlatDocument) -> Self {
        let mut votes = BTreeMap::new();

        for stored in document.votes {
            let parsed = Score::parse(&stored.score)
                .and_then(|score| NewVote::with_score(&stored.username, &stored.project_id, score));

            match parsed {
                Ok(vote) => {
                    let key = (vote.username().to_string(), vote.project_id().to_string());
                    votes.insert(key, vote.into_vote(stored.timestamp.unwrap_or_default()));
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping stored vote of '{}' on '{}': {}",
                        stored.username,
                        stored.project_id,
                        e
                    );
                }
            }
        }

        let aggregates = aggregate::summarize_all(votes.values());

        Self { votes, aggregates }
    }
}

fn to_document(votes: &BTreeMap<VoteKey, Vote>) -> FlatDocument {
    FlatDocument {
        votes: votes
            .values()
            .map(|vote| StoredVote {
                username: vote.username.clone(),
                project_id: vote.project_id.clone(),
                score: Value::from(vote.score),
                timestamp: Some(vote.timestamp),
            })
            .collect(),
    }
}

/// Store that keeps every vote in one JSON document.
///
/// Writers hold the lock across "apply, recompute, persist"; the in-memory
/// state only changes once the new file has replaced the old one.
#[derive(Debug)]
pub struct FlatFileStore {
    path: PathBuf,
    state: RwLock<FlatState>,
}

impl FlatFileStore {
    /// Loads `path` if it exists; a missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(json) => FlatState::from_document(parse_document(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No vote file at {}, starting empty", path.display());
                FlatState::default()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "Loaded {} votes from {}",
            state.votes.len(),
            path.display()
        );

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, votes: &BTreeMap<VoteKey, Vote>) -> Result<()> {
        let json = serde_json::to_vec_pretty(&to_document(votes))?;
        atomic::replace_file(&self.path, &json).await?;
        Ok(())
    }
}

#[async_trait]
impl VoteStore for FlatFileStore {
    fn kind(&self) -> StorageBackendKind {
        StorageBackendKind::FlatFile
    }

    async fn upsert(&self, vote: NewVote) -> Result<UpsertOutcome> {
        let mut state = self.state.write().await;

        let key = (vote.username().to_string(), vote.project_id().to_string());
        let project_id = vote.project_id().to_string();
        let stored = vote.into_vote(Utc::now());

        let mut votes = state.votes.clone();
        let created = votes.insert(key, stored.clone()).is_none();

        let aggregate = aggregate::summarize(
            &project_id,
            votes
                .values()
                .filter(|v| v.project_id == project_id)
                .map(|v| v.score),
        );

        self.persist(&votes).await?;

        state.votes = votes;
        state.aggregates.insert(project_id, aggregate.clone());

        Ok(UpsertOutcome {
            vote: stored,
            aggregate,
            created,
        })
    }

    async fn votes_for_project(&self, project_id: &str) -> Result<Vec<Vote>> {
        let state = self.state.read().await;

        Ok(state
            .votes
            .values()
            .filter(|v| v.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn votes_for_user(&self, username: &str) -> Result<Vec<Vote>> {
        let state = self.state.read().await;

        let mut votes: Vec<Vote> = state
            .votes
            .values()
            .filter(|v| v.username == username)
            .cloned()
            .collect();
        votes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(votes)
    }

    async fn aggregate(&self, project_id: &str) -> Result<Option<ProjectAggregate>> {
        Ok(self.state.read().await.aggregates.get(project_id).cloned())
    }

    async fn aggregates(&self) -> Result<Vec<ProjectAggregate>> {
        let mut aggregates: Vec<ProjectAggregate> =
            self.state.read().await.aggregates.values().cloned().collect();
        aggregates.sort_by(aggregate::rank_order);

        Ok(aggregates)
    }

    async fn totals(&self) -> Result<VoteTotals> {
        Ok(aggregate::totals(self.state.read().await.votes.values()))
    }

    async fn snapshot(&self) -> Result<StoreSnapshot> {
        let state = self.state.read().await;

        let mut aggregates: Vec<ProjectAggregate> = state.aggregates.values().cloned().collect();
        aggregates.sort_by(aggregate::rank_order);

        Ok(StoreSnapshot {
            votes: state.votes.values().cloned().collect(),
            aggregates,
        })
    }

    async fn rebuild_all(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        state.aggregates = aggregate::summarize_all(state.votes.values());

        Ok(state.aggregates.len() as u64)
    }
}
