use axum::{routing::get, Router};

use super::handlers::get_catalog;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_catalog))
}
