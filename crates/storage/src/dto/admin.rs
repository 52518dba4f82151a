use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RebuildStatsResponse {
    pub success: bool,
    pub rebuilt_projects: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MirrorSyncResponse {
    pub success: bool,
    pub projects: usize,
    pub users: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogReloadResponse {
    pub success: bool,
    pub projects: usize,
}
