use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{ProjectAggregate, Score};
use crate::error::{Result, StorageError};

/// One user's current rating of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vote {
    pub username: String,
    pub project_id: String,
    pub score: i64,
    pub timestamp: DateTime<Utc>,
}

/// A validated vote submission, ready to be written by any backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    username: String,
    project_id: String,
    score: Score,
}

impl NewVote {
    pub fn new(username: &str, project_id: &str, raw_score: &Value) -> Result<Self> {
        let (username, project_id) = required_identifiers(username, project_id)?;

        Ok(Self {
            username,
            project_id,
            score: Score::parse(raw_score)?,
        })
    }

    pub fn with_score(username: &str, project_id: &str, score: Score) -> Result<Self> {
        let (username, project_id) = required_identifiers(username, project_id)?;

        Ok(Self {
            username,
            project_id,
            score,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn into_vote(self, timestamp: DateTime<Utc>) -> Vote {
        Vote {
            username: self.username,
            project_id: self.project_id,
            score: self.score.value(),
            timestamp,
        }
    }
}

fn required_identifiers(username: &str, project_id: &str) -> Result<(String, String)> {
    let username = username.trim();
    if username.is_empty() {
        return Err(StorageError::validation("Username is required"));
    }

    let project_id = project_id.trim();
    if project_id.is_empty() {
        return Err(StorageError::validation("Project id is required"));
    }

    Ok((username.to_string(), project_id.to_string()))
}

/// Result of a committed upsert: the stored vote and the aggregate that was
/// recomputed in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub vote: Vote,
    pub aggregate: ProjectAggregate,
    /// `false` when an earlier vote for the same (user, project) was replaced.
    pub created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_vote_trims_identifiers() {
        let vote = NewVote::new("  alice ", " liceoX_3A_progettoY ", &json!(4)).unwrap();
        assert_eq!(vote.username(), "alice");
        assert_eq!(vote.project_id(), "liceoX_3A_progettoY");
        assert_eq!(vote.score().value(), 4);
    }

    #[test]
    fn test_new_vote_requires_username_and_project() {
        let error = NewVote::new("", "p1", &json!(3)).unwrap_err();
        assert_eq!(error.to_string(), "Username is required");

        let error = NewVote::new("alice", "   ", &json!(3)).unwrap_err();
        assert_eq!(error.to_string(), "Project id is required");
    }

    #[test]
    fn test_new_vote_rejects_bad_score() {
        let error = NewVote::new("alice", "p1", &json!(6)).unwrap_err();
        assert!(error.is_validation());
    }
}
