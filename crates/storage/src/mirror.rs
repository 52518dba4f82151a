//! Legacy flat-file projection of the vote store.
//!
//! Older readers consume two JSON files:
//! - `likes.json`: `project_id -> average_rating`
//! - `votes.json`: `username -> project_id -> score`
//!
//! Both are regenerated in full from a store snapshot and swapped in
//! atomically. The mirror is a best-effort cache; failures are reported to the
//! caller as [`MirrorError`] and never roll back a vote.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::atomic;
use crate::backend::{StoreSnapshot, VoteStore};
use crate::error::StorageError;

pub const LIKES_FILE: &str = "likes.json";
pub const VOTES_FILE: &str = "votes.json";

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Failed to read store snapshot: {0}")]
    Snapshot(#[from] StorageError),

    #[error("Failed to serialize mirror: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Exact bytes of both mirror files for a given snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMirror {
    pub likes: Vec<u8>,
    pub votes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorReport {
    pub projects: usize,
    pub users: usize,
}

#[derive(Debug)]
pub struct LegacyMirror {
    dir: PathBuf,
    // Held across snapshot + write, so an older snapshot can never land
    // after a newer one.
    lock: Mutex<()>,
}

impl LegacyMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn likes_path(&self) -> PathBuf {
        self.dir.join(LIKES_FILE)
    }

    pub fn votes_path(&self) -> PathBuf {
        self.dir.join(VOTES_FILE)
    }

    /// Whether `path` names one of the two files this mirror rewrites.
    pub fn writes_to(&self, path: &Path) -> bool {
        let target = resolve(path);
        [self.likes_path(), self.votes_path()]
            .iter()
            .any(|owned| resolve(owned) == target)
    }

    pub fn render(snapshot: &StoreSnapshot) -> Result<RenderedMirror, MirrorError> {
        let likes: BTreeMap<&str, f64> = snapshot
            .aggregates
            .iter()
            .map(|a| (a.project_id.as_str(), a.average_rating))
            .collect();

        let mut votes: BTreeMap<&str, BTreeMap<&str, i64>> = BTreeMap::new();
        for vote in &snapshot.votes {
            votes
                .entry(vote.username.as_str())
                .or_default()
                .insert(vote.project_id.as_str(), vote.score);
        }

        Ok(RenderedMirror {
            likes: serde_json::to_vec_pretty(&likes)?,
            votes: serde_json::to_vec_pretty(&votes)?,
        })
    }

    /// Regenerates both files from the store's current state.
    pub async fn sync(&self, store: &dyn VoteStore) -> Result<MirrorReport, MirrorError> {
        let _guard = self.lock.lock().await;

        let snapshot = store.snapshot().await?;
        let rendered = Self::render(&snapshot)?;

        self.write(&self.votes_path(), &rendered.votes).await?;
        self.write(&self.likes_path(), &rendered.likes).await?;

        let report = MirrorReport {
            projects: snapshot.aggregates.len(),
            users: snapshot
                .votes
                .iter()
                .map(|v| v.username.as_str())
                .collect::<std::collections::BTreeSet<_>>()
                .len(),
        };

        tracing::debug!(
            "Legacy mirror regenerated in {} ({} projects, {} users)",
            self.dir.display(),
            report.projects,
            report.users
        );

        Ok(report)
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), MirrorError> {
        atomic::replace_file(path, contents)
            .await
            .map_err(|source| MirrorError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Canonical form of `path` whose file may not exist yet.
fn resolve(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(parent), Some(name)) => parent.join(name),
        _ => path.to_path_buf(),
    }
}
