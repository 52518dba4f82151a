use std::sync::Arc;

use serde_json::Value;
use storage::{
    dto::{
        stats::ProjectStats,
        vote::{UserVoteEntry, UserVotesResponse},
    },
    error::StorageError,
    models::{ProjectAggregate, UpsertOutcome},
};

use crate::error::{WebError, WebResult};
use crate::state::AppState;

#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted(UpsertOutcome),
    /// The submission failed validation; nothing was written.
    Rejected(String),
}

/// Records a vote, refreshes the project's aggregate and the legacy mirror.
///
/// The write runs on its own task: once started it completes even if the
/// client goes away, so a vote is never left half-applied.
pub async fn submit_vote(
    state: &AppState,
    username: &str,
    project_id: &str,
    raw_score: Value,
) -> WebResult<SubmitOutcome> {
    let store = Arc::clone(&state.store);
    let mirror = Arc::clone(&state.mirror);
    let username = username.to_string();
    let project_id = project_id.to_string();

    let task = tokio::spawn(async move {
        let outcome = match store.upsert_vote(&username, &project_id, &raw_score).await {
            Ok(outcome) => outcome,
            Err(StorageError::Validation(reason)) => {
                tracing::debug!(
                    "Rejected vote of '{}' on '{}': {}",
                    username,
                    project_id,
                    reason
                );
                return Ok(SubmitOutcome::Rejected(reason));
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            "Vote {} by '{}' on '{}': {} (now {} votes, average {})",
            if outcome.created { "recorded" } else { "updated" },
            outcome.vote.username,
            outcome.vote.project_id,
            outcome.vote.score,
            outcome.aggregate.total_votes,
            outcome.aggregate.average_rating
        );

        if let Err(e) = mirror.sync(store.as_ref()).await {
            tracing::warn!(
                "Legacy mirror not updated after vote on '{}': {}",
                outcome.vote.project_id,
                e
            );
        }

        Ok(SubmitOutcome::Accepted(outcome))
    });

    let outcome = task
        .await
        .map_err(|e| WebError::InternalServerError(format!("Vote task failed: {}", e)))??;

    Ok(outcome)
}

/// Aggregate of one project with its catalog metadata.
///
/// Catalog projects nobody has rated yet report a zero aggregate; ids known
/// to neither the store nor the catalog are not found.
pub async fn get_project_stats(state: &AppState, project_id: &str) -> WebResult<ProjectStats> {
    let project_id = project_id.trim();
    if project_id.is_empty() {
        return Err(WebError::BadRequest("Project id is required".to_string()));
    }

    let catalog = state.catalog.current();
    let record = catalog.find(project_id);

    match state.store.aggregate(project_id).await? {
        Some(aggregate) => Ok(ProjectStats::new(aggregate, record)),
        None if record.is_some() => Ok(ProjectStats::new(
            ProjectAggregate::empty(project_id),
            record,
        )),
        None => Err(WebError::NotFound("Project not found".to_string())),
    }
}

/// A user's rating history, most recent first.
pub async fn get_user_votes(state: &AppState, username: &str) -> WebResult<UserVotesResponse> {
    let username = username.trim();
    if username.is_empty() {
        return Err(WebError::BadRequest("Username is required".to_string()));
    }

    let catalog = state.catalog.current();
    let votes = state
        .store
        .votes_for_user(username)
        .await?
        .into_iter()
        .map(|vote| {
            let record = catalog.find(&vote.project_id);
            UserVoteEntry::new(vote, record)
        })
        .collect();

    Ok(UserVotesResponse {
        success: true,
        username: username.to_string(),
        votes,
    })
}
