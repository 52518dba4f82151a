use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Catalog metadata for a project, as seen by the rating subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub school: String,
    pub class: String,
    pub description: String,
}
