//! Tests for the hosted backend client.
//!
//! These run against a mock server, so no real project is needed.

use serde_json::json;
use spooder_core::backend::{tables, AuthProvider, Backend, Query, RestBackend};
use spooder_core::task::TaskPriority;
use spooder_core::{BackendConfig, Error, Gateway, RetryPolicy};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";

fn config(server: &MockServer) -> BackendConfig {
    BackendConfig::new(format!("{}/", server.uri()), ANON_KEY).unwrap()
}

fn token_response() -> serde_json::Value {
    json!({
        "access_token": "session-token",
        "token_type": "bearer",
        "user": {
            "id": "u-1",
            "email": "ana@example.com",
            "user_metadata": { "username": "ana" }
        }
    })
}

// =============================================================================
// Rows
// =============================================================================

mod rows {
    use super::*;

    #[tokio::test]
    async fn test_select_sends_filters_and_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("select", "*"))
            .and(query_param("date", "eq.2024-05-01"))
            .and(query_param("order", "time_start.asc"))
            .and(header("apikey", ANON_KEY))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "t-1", "title": "Plan", "date": "2024-05-01" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        let query = Query::new()
            .eq("date", "2024-05-01")
            .order("time_start", spooder_core::backend::Direction::Ascending);
        let rows = backend.select(tables::TASKS, &query).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "t-1");
    }

    #[tokio::test]
    async fn test_insert_asks_for_representation() {
        let server = MockServer::start().await;
        let row = json!({ "name": "general" });
        Mock::given(method("POST"))
            .and(path("/rest/v1/channels"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!([row.clone()])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id": "c-1", "name": "general", "created_at": "2024-05-01T10:00:00Z" }
            ])))
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        let stored = backend.insert(tables::CHANNELS, vec![row]).await.unwrap();
        assert_eq!(stored[0]["id"], "c-1");
    }

    #[tokio::test]
    async fn test_update_and_delete_use_filters() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("id", "eq.t-1"))
            .and(body_json(json!({ "is_completed": true })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("id", "in.(t-1,t-2)"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        backend
            .update(
                tables::TASKS,
                &Query::new().eq("id", "t-1"),
                json!({ "is_completed": true }),
            )
            .await
            .unwrap();
        backend
            .delete(tables::TASKS, &Query::new().in_list("id", ["t-1", "t-2"]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        let result = backend.select(tables::PROFILES, &Query::new()).await;

        match result.unwrap_err() {
            Error::Backend { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "JWT expired");
            }
            e => panic!("Expected Backend error, got: {:?}", e),
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_uses_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .and(header("authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        let user = backend.sign_in("ana@example.com", "pw").await.unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.username.as_deref(), Some("ana"));
        assert_eq!(backend.current_user().await, Some(user));

        backend.select(tables::TASKS, &Query::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_up_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u-2",
                "email": "ben@example.com",
                "user_metadata": { "username": "ben", "name": "Ben" }
            })))
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        let registration = spooder_core::backend::Registration {
            username: "ben".into(),
            name: "Ben".into(),
            email: "ben@example.com".into(),
            password: "pw".into(),
        };
        let user = backend.sign_up(&registration).await.unwrap();
        assert_eq!(user.id, "u-2");
        // Email confirmation pending: no session yet
        assert!(backend.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        backend.sign_in("ana@example.com", "pw").await.unwrap();

        assert!(backend.sign_out().await.is_err());
        assert!(backend.current_user().await.is_none());
    }
}

// =============================================================================
// Storage
// =============================================================================

mod storage {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/spooderimage/pic.png"))
            .and(header("x-upsert", "true"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "pic.png" })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = RestBackend::new(&config(&server)).unwrap();
        backend
            .upload("spooderimage", "pic.png", b"png", "image/png")
            .await
            .unwrap();

        assert_eq!(
            backend.public_url("spooderimage", "pic.png"),
            format!("{}/storage/v1/object/public/spooderimage/pic.png", server.uri())
        );
    }
}

// =============================================================================
// Gateway over HTTP
// =============================================================================

mod gateway {
    use super::*;

    fn fast_config(server: &MockServer) -> BackendConfig {
        config(server).with_retry(
            RetryPolicy::default()
                .with_initial_backoff(Duration::from_millis(10))
                .with_attempt_timeout(Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_recovers_from_unavailable_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "t-1", "title": "Old", "date": "2024-05-01", "color": "red" }
            ])))
            .mount(&server)
            .await;

        let gateway = Gateway::connect(&fast_config(&server)).unwrap();
        let tasks = gateway.all_tasks().await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority(), Some(TaskPriority::High));
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .expect(3)
            .mount(&server)
            .await;

        let gateway = Gateway::connect(&fast_config(&server)).unwrap();
        let err = gateway.all_profiles().await.unwrap_err();

        assert_eq!(err.attempts, 3);
        assert!(matches!(err.cause(), Error::Backend { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/channels"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = config(&server).with_retry(
            RetryPolicy::default()
                .with_max_attempts(2)
                .with_initial_backoff(Duration::from_millis(10))
                .with_attempt_timeout(Duration::from_millis(50)),
        );
        let gateway = Gateway::connect(&config).unwrap();
        let err = gateway.channel_by_id("c-1").await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.attempts, 2);
    }
}
