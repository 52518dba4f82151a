use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{ProjectAggregate, ProjectRecord, Vote};

/// Vote submission as sent by the browser client.
///
/// Field names follow the legacy client (`projectId`, `vote`); the snake_case
/// spellings are accepted too. The score is kept raw and coerced by the store.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitVoteRequest {
    /// Optional; when present it must match the authenticated identity.
    #[serde(default)]
    #[validate(length(max = 128, message = "Username must be at most 128 characters"))]
    pub username: Option<String>,

    #[serde(default, rename = "projectId", alias = "project_id")]
    #[validate(length(max = 255, message = "Project id must be at most 255 characters"))]
    pub project_id: String,

    #[serde(default, alias = "score")]
    #[schema(value_type = Object, example = 4)]
    pub vote: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitVoteResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectAggregate>,
}

impl SubmitVoteResponse {
    pub fn accepted(aggregate: ProjectAggregate) -> Self {
        Self {
            success: true,
            message: "Vote saved".to_string(),
            project: Some(aggregate),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            message: reason.into(),
            project: None,
        }
    }
}

/// One entry of a user's rating history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserVoteEntry {
    pub project_id: String,
    pub score: i64,
    pub timestamp: DateTime<Utc>,
    pub project_name: Option<String>,
    pub school: Option<String>,
    pub class: Option<String>,
}

impl UserVoteEntry {
    pub fn new(vote: Vote, record: Option<&ProjectRecord>) -> Self {
        Self {
            project_id: vote.project_id,
            score: vote.score,
            timestamp: vote.timestamp,
            project_name: record.map(|r| r.name.clone()),
            school: record.map(|r| r.school.clone()),
            class: record.map(|r| r.class.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserVotesResponse {
    pub success: bool,
    pub username: String,
    pub votes: Vec<UserVoteEntry>,
}
