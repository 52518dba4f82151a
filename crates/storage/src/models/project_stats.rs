use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Derived `{count, average}` summary of a project's votes.
///
/// Never authoritative: every value can be rebuilt from the vote set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectAggregate {
    pub project_id: String,
    pub total_votes: i64,
    /// Rounded to one decimal place; `0` when there are no votes.
    pub average_rating: f64,
}

impl ProjectAggregate {
    pub fn empty(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            total_votes: 0,
            average_rating: 0.0,
        }
    }
}

/// Totals across every individual vote in the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct VoteTotals {
    pub total_votes: i64,
    pub distinct_rated_projects: i64,
    /// Mean of all scores (not of per-project averages), one decimal.
    pub overall_average: f64,
}
