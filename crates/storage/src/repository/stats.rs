use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::models::ProjectAggregate;
use crate::repository::vote::VoteRepository;
use crate::services::aggregate;

/// Access to the `project_stats` cache table.
pub struct StatsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StatsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, project_id: &str) -> Result<Option<ProjectAggregate>> {
        let aggregate = sqlx::query_as::<_, ProjectAggregate>(
            r#"
            SELECT project_id, total_votes, average_rating
            FROM project_stats
            WHERE project_id = ?
            "#,
        )
        .bind(project_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(aggregate)
    }

    pub async fn list(&self) -> Result<Vec<ProjectAggregate>> {
        let mut conn = self.pool.acquire().await?;
        Self::list_in(&mut conn).await
    }

    /// Drops every cached row and derives all aggregates from the votes table.
    pub async fn rebuild_all(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM project_stats")
            .execute(&mut *tx)
            .await?;

        let votes = VoteRepository::list_in(&mut tx).await?;
        let aggregates = aggregate::summarize_all(&votes);

        for aggregate in aggregates.values() {
            Self::store_in(&mut tx, aggregate).await?;
        }

        tx.commit().await?;

        Ok(aggregates.len() as u64)
    }

    /// Recomputes one project's aggregate from the votes visible on `conn`.
    pub(crate) async fn recompute_in(
        conn: &mut SqliteConnection,
        project_id: &str,
    ) -> Result<ProjectAggregate> {
        let scores: Vec<i64> = sqlx::query_scalar("SELECT score FROM votes WHERE project_id = ?")
            .bind(project_id)
            .fetch_all(&mut *conn)
            .await?;

        let aggregate = aggregate::summarize(project_id, scores);

        if aggregate.total_votes == 0 {
            sqlx::query("DELETE FROM project_stats WHERE project_id = ?")
                .bind(project_id)
                .execute(&mut *conn)
                .await?;
        } else {
            Self::store_in(conn, &aggregate).await?;
        }

        Ok(aggregate)
    }

    pub(crate) async fn list_in(conn: &mut SqliteConnection) -> Result<Vec<ProjectAggregate>> {
        let aggregates = sqlx::query_as::<_, ProjectAggregate>(
            r#"
            SELECT project_id, total_votes, average_rating
            FROM project_stats
            ORDER BY total_votes DESC, average_rating DESC, project_id
            "#,
        )
        .fetch_all(conn)
        .await?;

        Ok(aggregates)
    }

    async fn store_in(conn: &mut SqliteConnection, aggregate: &ProjectAggregate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_stats (project_id, total_votes, average_rating, last_updated)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (project_id)
            DO UPDATE SET
                total_votes = excluded.total_votes,
                average_rating = excluded.average_rating,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&aggregate.project_id)
        .bind(aggregate.total_votes)
        .bind(aggregate.average_rating)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }
}
