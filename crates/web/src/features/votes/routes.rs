use axum::{routing::get, Router};

use super::handlers::{get_user_votes, get_vote_stats, submit_vote};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_vote_stats).post(submit_vote))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/:username/votes", get(get_user_votes))
}
