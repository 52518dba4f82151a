use std::collections::HashSet;

use storage::{
    dto::stats::{AllStatsResponse, ProjectStats},
    models::ProjectAggregate,
    services::aggregate,
};

use crate::error::WebResult;
use crate::state::AppState;

/// Dashboard view: every catalog project plus every rated project the
/// catalog no longer lists, best rated first.
pub async fn get_all_stats(state: &AppState) -> WebResult<AllStatsResponse> {
    let catalog = state.catalog.current();
    let snapshot = state.store.snapshot().await?;

    let rated: HashSet<&str> = snapshot
        .aggregates
        .iter()
        .map(|a| a.project_id.as_str())
        .collect();

    let mut aggregates: Vec<ProjectAggregate> = catalog
        .records()
        .filter(|record| !rated.contains(record.id.as_str()))
        .map(|record| ProjectAggregate::empty(&record.id))
        .collect();
    aggregates.extend(snapshot.aggregates.iter().cloned());
    aggregates.sort_by(aggregate::rank_order);

    let projects = aggregates
        .into_iter()
        .map(|a| {
            let record = catalog.find(&a.project_id);
            ProjectStats::new(a, record)
        })
        .collect();

    Ok(AllStatsResponse {
        success: true,
        projects,
        stats: aggregate::totals(&snapshot.votes),
    })
}
