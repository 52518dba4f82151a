use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use storage::error::StorageError;

use crate::traits::{DataImporter, ImportContext, ImportReport, read_source};
use crate::Result;

/// Legacy `votes.json` layout: `username -> project_id -> score`.
type LegacyVotes = BTreeMap<String, BTreeMap<String, Value>>;

/// Replays a legacy vote file through the configured store. Each vote goes
/// through the regular upsert, so aggregates end up exactly as if the votes
/// had been cast live. Votes the store rejects are skipped.
pub struct LegacyVotesImporter;

#[async_trait::async_trait]
impl DataImporter for LegacyVotesImporter {
    async fn import(&self, source: &Path, context: &ImportContext) -> Result<ImportReport> {
        let json = read_source(source).await?;
        let votes: LegacyVotes = serde_json::from_str(&json)?;

        tracing::info!(
            "Loaded votes of {} users from {}",
            votes.len(),
            source.display()
        );

        let mut report = ImportReport::default();

        for (username, projects) in &votes {
            for (project_id, raw_score) in projects {
                match context.store.upsert_vote(username, project_id, raw_score).await {
                    Ok(outcome) => {
                        tracing::debug!(
                            "{} -> {} = {}",
                            outcome.vote.username,
                            outcome.vote.project_id,
                            outcome.vote.score
                        );
                        report.imported += 1;
                    }
                    Err(StorageError::Validation(reason)) => {
                        report.skip(format!(
                            "Skipped vote of '{}' on '{}' ({}): {}",
                            username, project_id, raw_score, reason
                        ));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(report)
    }
}
