use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{ProjectAggregate, ProjectRecord, VoteTotals};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Restrict the answer to one project.
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
}

/// Aggregate of a project joined with its catalog metadata. The metadata
/// fields are empty when the catalog no longer lists the project.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProjectStats {
    pub id: String,
    pub name: String,
    pub school: String,
    pub class: String,
    pub total_votes: i64,
    pub average_rating: f64,
}

impl ProjectStats {
    pub fn new(aggregate: ProjectAggregate, record: Option<&ProjectRecord>) -> Self {
        Self {
            id: aggregate.project_id,
            name: record.map(|r| r.name.clone()).unwrap_or_default(),
            school: record.map(|r| r.school.clone()).unwrap_or_default(),
            class: record.map(|r| r.class.clone()).unwrap_or_default(),
            total_votes: aggregate.total_votes,
            average_rating: aggregate.average_rating,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectStatsResponse {
    pub success: bool,
    pub project: ProjectStats,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AllStatsResponse {
    pub success: bool,
    pub projects: Vec<ProjectStats>,
    pub stats: VoteTotals,
}
