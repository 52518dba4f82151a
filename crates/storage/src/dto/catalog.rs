use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::CatalogTree;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub success: bool,
    pub total_projects: usize,
    /// school -> class -> projects
    #[schema(value_type = Object)]
    pub schools: CatalogTree,
}
