use storage::mirror::MirrorReport;

use crate::error::WebResult;
use crate::state::AppState;

/// Recomputes every cached aggregate from the votes, then refreshes the
/// legacy mirror so it reflects the rebuilt values.
pub async fn rebuild_stats(state: &AppState) -> WebResult<u64> {
    let rebuilt = state.store.rebuild_all().await?;
    tracing::info!("Rebuilt aggregates of {} projects", rebuilt);

    if let Err(e) = state.mirror.sync(state.store.as_ref()).await {
        tracing::warn!("Legacy mirror not updated after rebuild: {}", e);
    }

    Ok(rebuilt)
}

pub async fn sync_mirror(state: &AppState) -> WebResult<MirrorReport> {
    let report = state.mirror.sync(state.store.as_ref()).await?;

    tracing::info!(
        "Legacy mirror regenerated in {} ({} projects, {} users)",
        state.mirror.dir().display(),
        report.projects,
        report.users
    );

    Ok(report)
}
