mod project;
mod project_stats;
mod score;
mod vote;

pub use project::ProjectRecord;
pub use project_stats::{ProjectAggregate, VoteTotals};
pub use score::Score;
pub use vote::{NewVote, UpsertOutcome, Vote};
