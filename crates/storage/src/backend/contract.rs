//! Behaviour every `VoteStore` backend must share.

use std::sync::Arc;

use serde_json::json;

use super::VoteStore;
use crate::models::{ProjectAggregate, VoteTotals};

pub(crate) async fn upsert_and_rerate(store: &dyn VoteStore) {
    let project = "liceoX_3A_progettoY";
    assert_eq!(store.aggregate(project).await.unwrap(), None);

    let outcome = store.upsert_vote("alice", project, &json!(4)).await.unwrap();
    assert!(outcome.created);
    assert_eq!(outcome.aggregate.total_votes, 1);
    assert_eq!(outcome.aggregate.average_rating, 4.0);

    let outcome = store.upsert_vote("bob", project, &json!("2")).await.unwrap();
    assert!(outcome.created);
    assert_eq!(outcome.aggregate.total_votes, 2);
    assert_eq!(outcome.aggregate.average_rating, 3.0);

    let outcome = store.upsert_vote("alice", project, &json!(5)).await.unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.vote.score, 5);
    assert_eq!(
        outcome.aggregate,
        ProjectAggregate {
            project_id: project.to_string(),
            total_votes: 2,
            average_rating: 3.5,
        }
    );

    assert_eq!(store.aggregate(project).await.unwrap(), Some(outcome.aggregate));

    let votes = store.votes_for_project(project).await.unwrap();
    let scores: Vec<(&str, i64)> = votes
        .iter()
        .map(|v| (v.username.as_str(), v.score))
        .collect();
    assert_eq!(scores, vec![("alice", 5), ("bob", 2)]);
}

pub(crate) async fn validation_leaves_store_untouched(store: &dyn VoteStore) {
    for raw in [json!(0), json!(6), json!(-1), json!("abc"), json!(null)] {
        let error = store.upsert_vote("alice", "p1", &raw).await.unwrap_err();
        assert!(error.is_validation(), "{raw} should be rejected");
    }

    assert!(store.upsert_vote("", "p1", &json!(3)).await.unwrap_err().is_validation());
    assert!(store.upsert_vote("alice", "", &json!(3)).await.unwrap_err().is_validation());

    assert!(store.votes_for_project("p1").await.unwrap().is_empty());
    assert!(store.aggregates().await.unwrap().is_empty());
    assert_eq!(store.totals().await.unwrap(), VoteTotals::default());

    store.upsert_vote("alice", "p1", &json!(1)).await.unwrap();
    store.upsert_vote("bob", "p1", &json!(5)).await.unwrap();
    assert_eq!(store.aggregate("p1").await.unwrap().unwrap().total_votes, 2);
}

pub(crate) async fn user_votes_most_recent_first(store: &dyn VoteStore) {
    store.upsert_vote("alice", "p1", &json!(3)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.upsert_vote("alice", "p2", &json!(4)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.upsert_vote("bob", "p1", &json!(2)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    // Re-rating moves p1 back to the top.
    store.upsert_vote("alice", "p1", &json!(5)).await.unwrap();

    let votes = store.votes_for_user("alice").await.unwrap();
    let projects: Vec<&str> = votes.iter().map(|v| v.project_id.as_str()).collect();
    assert_eq!(projects, vec!["p1", "p2"]);
    assert_eq!(votes[0].score, 5);

    assert!(store.votes_for_user("nobody").await.unwrap().is_empty());
}

pub(crate) async fn rebuild_matches_incremental(store: &dyn VoteStore) {
    let ratings = [
        ("alice", "p1", 5),
        ("bob", "p1", 4),
        ("carol", "p1", 4),
        ("alice", "p2", 1),
        ("bob", "p2", 2),
        ("dave", "p3", 3),
        ("bob", "p1", 1),
    ];
    for (username, project_id, score) in ratings {
        store
            .upsert_vote(username, project_id, &json!(score))
            .await
            .unwrap();
    }

    let incremental = store.aggregates().await.unwrap();
    assert_eq!(store.rebuild_all().await.unwrap(), 3);
    let rebuilt = store.aggregates().await.unwrap();

    assert_eq!(incremental, rebuilt);

    let p1 = rebuilt.iter().find(|a| a.project_id == "p1").unwrap();
    assert_eq!(p1.total_votes, 3);
    assert_eq!(p1.average_rating, 3.3);
}

pub(crate) async fn totals_and_snapshot(store: &dyn VoteStore) {
    store.upsert_vote("alice", "p1", &json!(5)).await.unwrap();
    store.upsert_vote("alice", "p2", &json!(1)).await.unwrap();
    store.upsert_vote("bob", "p2", &json!(2)).await.unwrap();

    let totals = store.totals().await.unwrap();
    assert_eq!(totals.total_votes, 3);
    assert_eq!(totals.distinct_rated_projects, 2);
    assert_eq!(totals.overall_average, 2.7);

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.votes.len(), 3);
    let ids: Vec<&str> = snapshot
        .aggregates
        .iter()
        .map(|a| a.project_id.as_str())
        .collect();
    assert_eq!(ids, vec!["p2", "p1"]);
}

pub(crate) async fn concurrent_distinct_users(store: Arc<dyn VoteStore>) {
    let scores: Vec<i64> = (0..24).map(|i| (i % 5) + 1).collect();

    let handles: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            let store = Arc::clone(&store);
            let score = *score;
            tokio::spawn(async move {
                store
                    .upsert_vote(&format!("user{i}"), "shared", &json!(score))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let aggregate = store.aggregate("shared").await.unwrap().unwrap();
    let expected = crate::services::aggregate::summarize("shared", scores.iter().copied());
    assert_eq!(aggregate.total_votes, 24);
    assert_eq!(aggregate, expected);
    assert_eq!(store.votes_for_project("shared").await.unwrap().len(), 24);
}

/// Distinct-user writers on one project race a single user re-rating another
/// project, with snapshot readers in between.
pub(crate) async fn concurrent_mixed_writers(store: Arc<dyn VoteStore>) {
    const WRITERS: usize = 40;

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let distinct = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let score = json!((i % 5) + 1);
            distinct
                .upsert_vote(&format!("user{i}"), "shared", &score)
                .await
                .map(|_| ())
        }));

        let same_key = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let score = json!((i % 5) + 1);
            same_key
                .upsert_vote("alice", "rerated", &score)
                .await
                .map(|_| ())
        }));

        let reader = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let snapshot = reader.snapshot().await?;
            for aggregate in &snapshot.aggregates {
                let votes = snapshot
                    .votes
                    .iter()
                    .filter(|v| v.project_id == aggregate.project_id)
                    .count();
                assert_eq!(aggregate.total_votes as usize, votes);
            }
            Ok::<(), crate::StorageError>(())
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let shared = store.aggregate("shared").await.unwrap().unwrap();
    assert_eq!(shared.total_votes, WRITERS as i64);

    let rerated = store.aggregate("rerated").await.unwrap().unwrap();
    let stored = store.votes_for_project("rerated").await.unwrap();
    assert_eq!(rerated.total_votes, 1);
    assert_eq!(stored.len(), 1);
    assert_eq!(rerated.average_rating, stored[0].score as f64);
}
