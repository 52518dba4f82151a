use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::models::{NewVote, UpsertOutcome, Vote, VoteTotals};
use crate::repository::stats::StatsRepository;
use crate::services::aggregate;

#[derive(FromRow)]
struct UpsertedRow {
    username: String,
    project_id: String,
    score: i64,
    timestamp: DateTime<Utc>,
    revision: i64,
}

pub struct VoteRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VoteRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Writes the vote and recomputes the project's aggregate in a single
    /// transaction. The vote write is the first statement, so SQLite takes
    /// the writer lock before the aggregate reads the vote set.
    pub async fn upsert(&self, vote: &NewVote) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let row: UpsertedRow = sqlx::query_as(
            r#"
            INSERT INTO votes (username, project_id, score, revision, voted_at)
            VALUES (?, ?, ?, 1, ?)
            ON CONFLICT (username, project_id)
            DO UPDATE SET
                score = excluded.score,
                revision = votes.revision + 1,
                voted_at = excluded.voted_at
            RETURNING username, project_id, score, voted_at AS timestamp, revision
            "#,
        )
        .bind(vote.username())
        .bind(vote.project_id())
        .bind(vote.score().value())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let aggregate = StatsRepository::recompute_in(&mut tx, vote.project_id()).await?;

        tx.commit().await?;

        Ok(UpsertOutcome {
            vote: Vote {
                username: row.username,
                project_id: row.project_id,
                score: row.score,
                timestamp: row.timestamp,
            },
            aggregate,
            created: row.revision == 1,
        })
    }

    pub async fn find_by_project(&self, project_id: &str) -> Result<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(
            r#"
            SELECT username, project_id, score, voted_at AS timestamp
            FROM votes
            WHERE project_id = ?
            ORDER BY username
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(votes)
    }

    /// Most recent first.
    pub async fn find_by_user(&self, username: &str) -> Result<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(
            r#"
            SELECT username, project_id, score, voted_at AS timestamp
            FROM votes
            WHERE username = ?
            ORDER BY voted_at DESC, id DESC
            "#,
        )
        .bind(username)
        .fetch_all(self.pool)
        .await?;

        Ok(votes)
    }

    pub async fn totals(&self) -> Result<VoteTotals> {
        let (total_votes, distinct_rated_projects, score_sum): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(DISTINCT project_id), COALESCE(SUM(score), 0)
            FROM votes
            WHERE score BETWEEN 1 AND 5
            "#,
        )
        .fetch_one(self.pool)
        .await?;

        Ok(VoteTotals {
            total_votes,
            distinct_rated_projects,
            overall_average: aggregate::average(score_sum, total_votes),
        })
    }

    pub(crate) async fn list_in(conn: &mut SqliteConnection) -> Result<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(
            r#"
            SELECT username, project_id, score, voted_at AS timestamp
            FROM votes
            ORDER BY username, project_id
            "#,
        )
        .fetch_all(conn)
        .await?;

        Ok(votes)
    }
}
