use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::{
    stats::{AllStatsResponse, ProjectStatsResponse, StatsQuery},
    vote::{SubmitVoteRequest, SubmitVoteResponse, UserVotesResponse},
};
use validator::Validate;

use crate::error::WebError;
use crate::features::stats;
use crate::middleware::identity::AuthenticatedUser;
use crate::state::AppState;

use super::services::{self, SubmitOutcome};

#[utoipa::path(
    post,
    path = "/api/vote",
    request_body = SubmitVoteRequest,
    params(
        ("x-authenticated-user" = String, Header, description = "Username verified by the authentication layer")
    ),
    responses(
        (status = 200, description = "Vote recorded, updated aggregate returned", body = SubmitVoteResponse),
        (status = 400, description = "Invalid vote", body = SubmitVoteResponse),
        (status = 401, description = "No authenticated user"),
        (status = 403, description = "Body username does not match the authenticated user"),
        (status = 503, description = "Storage temporarily unavailable")
    ),
    tag = "votes"
)]
pub async fn submit_vote(
    State(state): State<AppState>,
    AuthenticatedUser(username): AuthenticatedUser,
    payload: Result<Json<SubmitVoteRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(req) = payload?;
    req.validate()?;

    let claimed = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|claimed| !claimed.is_empty());

    if let Some(claimed) = claimed.filter(|claimed| *claimed != username) {
        tracing::warn!("User '{}' tried to vote as '{}'", username, claimed);
        return Err(WebError::Forbidden(
            "You can only vote as yourself".to_string(),
        ));
    }

    let outcome = services::submit_vote(&state, &username, &req.project_id, req.vote).await?;

    let response = match outcome {
        SubmitOutcome::Accepted(outcome) => {
            (StatusCode::OK, Json(SubmitVoteResponse::accepted(outcome.aggregate)))
        }
        SubmitOutcome::Rejected(reason) => (
            StatusCode::BAD_REQUEST,
            Json(SubmitVoteResponse::rejected(reason)),
        ),
    };

    Ok(response.into_response())
}

#[utoipa::path(
    get,
    path = "/api/vote",
    params(StatsQuery),
    responses(
        (status = 200, description = "Stats of one project, or of every project when no id is given", body = ProjectStatsResponse),
        (status = 404, description = "Project not found")
    ),
    tag = "votes"
)]
pub async fn get_vote_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Response, WebError> {
    let Query(query) = query?;
    match query.project_id {
        Some(project_id) => {
            let project = services::get_project_stats(&state, &project_id).await?;

            Ok(Json(ProjectStatsResponse {
                success: true,
                project,
            })
            .into_response())
        }
        None => {
            let response: AllStatsResponse = stats::services::get_all_stats(&state).await?;

            Ok(Json(response).into_response())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{username}/votes",
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "The user's votes, most recent first", body = UserVotesResponse),
        (status = 400, description = "Empty username")
    ),
    tag = "votes"
)]
pub async fn get_user_votes(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, WebError> {
    let response = services::get_user_votes(&state, &username).await?;

    Ok(Json(response).into_response())
}
