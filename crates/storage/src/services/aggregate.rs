//! Aggregate engine: the single definition of how a vote set turns into a
//! [`ProjectAggregate`]. Both storage backends call into this module, so the
//! incrementally maintained value and a full rebuild can never disagree.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{ProjectAggregate, Score, Vote, VoteTotals};

/// Rounds to one decimal place, ties to even on the exact binary value
/// (`3.25 -> 3.2`, `2.75 -> 2.8`).
pub fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

fn is_countable(score: i64) -> bool {
    (Score::MIN..=Score::MAX).contains(&score)
}

/// Recomputes the aggregate of one project from its scores.
///
/// Scores outside the rating scale (legacy rows with zero or negative
/// values) are ignored instead of failing the computation.
pub fn summarize<I>(project_id: &str, scores: I) -> ProjectAggregate
where
    I: IntoIterator<Item = i64>,
{
    let (count, sum) = scores
        .into_iter()
        .filter(|score| is_countable(*score))
        .fold((0i64, 0i64), |(count, sum), score| (count + 1, sum + score));

    ProjectAggregate {
        project_id: project_id.to_string(),
        total_votes: count,
        average_rating: average(sum, count),
    }
}

/// Derives every project's aggregate from scratch.
pub fn summarize_all<'a, I>(votes: I) -> BTreeMap<String, ProjectAggregate>
where
    I: IntoIterator<Item = &'a Vote>,
{
    let mut scores: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for vote in votes {
        scores
            .entry(vote.project_id.as_str())
            .or_default()
            .push(vote.score);
    }

    scores
        .into_iter()
        .map(|(project_id, scores)| (project_id.to_string(), summarize(project_id, scores)))
        .filter(|(_, aggregate)| aggregate.total_votes > 0)
        .collect()
}

/// Totals over individual votes; the overall average weighs every vote
/// equally rather than averaging per-project averages.
pub fn totals<'a, I>(votes: I) -> VoteTotals
where
    I: IntoIterator<Item = &'a Vote>,
{
    let mut projects = std::collections::BTreeSet::new();
    let mut count = 0i64;
    let mut sum = 0i64;

    for vote in votes.into_iter().filter(|vote| is_countable(vote.score)) {
        projects.insert(vote.project_id.as_str());
        count += 1;
        sum += vote.score;
    }

    VoteTotals {
        total_votes: count,
        distinct_rated_projects: projects.len() as i64,
        overall_average: average(sum, count),
    }
}

/// Mean of `count` scores summing to `sum`, one decimal; `0` for no scores.
pub fn average(sum: i64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        round_one_decimal(sum as f64 / count as f64)
    }
}

/// Dashboard order: most votes first, then best average, then id.
pub fn rank_order(a: &ProjectAggregate, b: &ProjectAggregate) -> Ordering {
    b.total_votes
        .cmp(&a.total_votes)
        .then_with(|| b.average_rating.total_cmp(&a.average_rating))
        .then_with(|| a.project_id.cmp(&b.project_id))
}
