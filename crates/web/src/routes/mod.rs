use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

use crate::features::{admin, catalog, stats, votes};
use crate::middleware::auth::ApiKeys;
use crate::state::AppState;

pub fn router(state: AppState, api_keys: ApiKeys, projects_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .nest("/vote", votes::routes::routes())
        .nest("/users", votes::routes::user_routes())
        .nest("/stats", stats::routes::routes())
        .nest("/catalog", catalog::routes::routes())
        .nest("/admin", admin::routes::routes(api_keys));

    let router = Router::new().nest("/api", api).with_state(state);

    match projects_dir {
        Some(dir) => router.nest_service("/progetti", ServeDir::new(dir)),
        None => router,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_IDENTITY_HEADER;
    use crate::test_support::{flat_file_state, relational_state};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const API_KEY: &str = "test-key";

    async fn app() -> (tempfile::TempDir, Router) {
        let (dir, state) = relational_state().await;
        let router = router(state, ApiKeys::from_comma_separated(API_KEY), None);
        (dir, router)
    }

    fn vote_request(user: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/vote")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(DEFAULT_IDENTITY_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn raw_vote_request(content_type: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/vote")
            .header(DEFAULT_IDENTITY_HEADER, "alice");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn admin_post(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_vote_sequence_over_http() {
        let (_dir, app) = app().await;

        let (status, body) = send(
            &app,
            vote_request(Some("alice"), json!({"projectId": "liceoX_3A_progettoY", "vote": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["project"]["total_votes"], 1);
        assert_eq!(body["project"]["average_rating"], 4.0);

        let (_, body) = send(
            &app,
            vote_request(Some("bob"), json!({"project_id": "liceoX_3A_progettoY", "score": "2"})),
        )
        .await;
        assert_eq!(body["project"]["total_votes"], 2);
        assert_eq!(body["project"]["average_rating"], 3.0);

        let (_, body) = send(
            &app,
            vote_request(
                Some("alice"),
                json!({"username": "alice", "projectId": "liceoX_3A_progettoY", "vote": 5}),
            ),
        )
        .await;
        assert_eq!(body["project"]["total_votes"], 2);
        assert_eq!(body["project"]["average_rating"], 3.5);

        let (status, body) = send(&app, get("/api/vote?project_id=liceoX_3A_progettoY")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project"]["name"], "Progetto Y");
        assert_eq!(body["project"]["school"], "liceoX");
        assert_eq!(body["project"]["total_votes"], 2);
    }

    #[tokio::test]
    async fn test_invalid_vote_is_rejected() {
        let (_dir, app) = app().await;

        let (status, body) = send(
            &app,
            vote_request(Some("alice"), json!({"projectId": "p1", "vote": 6})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Vote must be between 1 and 5");

        let (status, _) = send(&app, get("/api/vote?project_id=p1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_vote_body_gets_json_error() {
        let (_dir, app) = app().await;

        let cases = [
            (Some("application/json"), r#"{"projectId": 5, "vote": 3}"#),
            (Some("application/json"), r#"{"projectId": "p1", "vote": "#),
            (None, r#"{"projectId": "p1", "vote": 3}"#),
        ];

        for (content_type, body) in cases {
            let (status, body) = send(&app, raw_vote_request(content_type, body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(body["success"], false);
            assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
        }

        let (status, _) = send(&app, get("/api/vote?project_id=p1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vote_requires_identity() {
        let (_dir, app) = app().await;

        let request = vote_request(None, json!({"projectId": "p1", "vote": 3}));
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_cannot_vote_as_someone_else() {
        let (_dir, app) = app().await;

        let (status, _) = send(
            &app,
            vote_request(Some("alice"), json!({"username": "bob", "projectId": "p1", "vote": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, get("/api/vote?project_id=p1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_endpoints() {
        let (_dir, app) = app().await;
        for (user, score) in [("alice", 5), ("bob", 4)] {
            let body = json!({"projectId": "itisW_5B_avventura", "vote": score});
            send(&app, vote_request(Some(user), body)).await;
        }

        let (status, body) = send(&app, get("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["projects"].as_array().unwrap().len(), 3);
        assert_eq!(body["projects"][0]["id"], "itisW_5B_avventura");
        assert_eq!(body["projects"][0]["average_rating"], 4.5);
        assert_eq!(body["stats"]["total_votes"], 2);
        assert_eq!(body["stats"]["distinct_rated_projects"], 1);
        assert_eq!(body["stats"]["overall_average"], 4.5);

        let (_, without_id) = send(&app, get("/api/vote")).await;
        assert_eq!(without_id, body);
    }

    #[tokio::test]
    async fn test_user_votes_endpoint() {
        let (_dir, app) = app().await;
        let body = json!({"projectId": "liceoX_3A_progettoZ", "vote": 2});
        send(&app, vote_request(Some("alice"), body)).await;

        let (status, body) = send(&app, get("/api/users/alice/votes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["votes"][0]["project_id"], "liceoX_3A_progettoZ");
        assert_eq!(body["votes"][0]["score"], 2);
        assert_eq!(body["votes"][0]["project_name"], "Progetto Z");
        assert_eq!(body["votes"][0]["class"], "3A");

        let (_, body) = send(&app, get("/api/users/nobody/votes")).await;
        assert_eq!(body["votes"], json!([]));
    }

    #[tokio::test]
    async fn test_catalog_endpoint() {
        let (_dir, app) = app().await;

        let (status, body) = send(&app, get("/api/catalog")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_projects"], 3);
        assert_eq!(body["schools"]["itisW"]["5B"][0]["name"], "Avventura");
    }

    #[tokio::test]
    async fn test_admin_routes_require_api_key() {
        let (_dir, app) = app().await;

        let (status, _) = send(&app, admin_post("/api/admin/stats/rebuild", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, admin_post("/api/admin/stats/rebuild", Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send(&app, admin_post("/api/admin/stats/rebuild", Some(API_KEY))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rebuilt_projects"], 0);
    }

    #[tokio::test]
    async fn test_admin_mirror_sync() {
        let (_dir, state) = flat_file_state().await;
        let mirror = state.mirror.clone();
        let app = router(state, ApiKeys::from_comma_separated(API_KEY), None);
        send(&app, vote_request(Some("alice"), json!({"projectId": "p1", "vote": 4}))).await;

        let (status, body) = send(&app, admin_post("/api/admin/mirror/sync", Some(API_KEY))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["projects"], 1);
        assert_eq!(body["users"], 1);

        let votes: Value =
            serde_json::from_slice(&tokio::fs::read(mirror.votes_path()).await.unwrap()).unwrap();
        assert_eq!(votes, json!({"alice": {"p1": 4}}));
    }

    #[tokio::test]
    async fn test_project_files_are_served_inside_root_only() {
        let (dir, state) = relational_state().await;
        let root = dir.path().join("progetti");
        tokio::fs::create_dir_all(root.join("liceoX")).await.unwrap();
        tokio::fs::write(root.join("liceoX/storia.html"), "<html></html>").await.unwrap();
        tokio::fs::write(dir.path().join("secret.txt"), "secret").await.unwrap();

        let app = router(state, ApiKeys::default(), Some(root.as_path()));

        let response = app.clone().oneshot(get("/progetti/liceoX/storia.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get("/progetti/../secret.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
