//! End-to-end flows against a mock HelloFlex server.
//!
//! Wires up: mock token endpoint → `HelloFlexClient` → mock API endpoints,
//! and checks the token lifecycle, request encoding and response decoding.

use std::convert::Infallible;
use std::future::IntoFuture;
use std::sync::{Arc, Mutex};

use helloflex_client::{HelloFlexClient, HelloFlexError, TOKEN_ENDPOINT, Token};
use httpmock::prelude::*;
use serde_json::json;

const TOKEN_FORM: &str = "client_id=a&client_secret=b&grant_type=client_credentials";

fn token_json(token: &str, expires_in: i64) -> String {
    format!(r#"{{"access_token":"{token}","expires_in":{expires_in}}}"#)
}

fn client_for(server: &MockServer) -> HelloFlexClient {
    HelloFlexClient::builder("a", "b")
        .with_base_url(server.base_url())
        .expect("valid base url")
        .build()
        .expect("should build client")
}

fn token_mock<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
    let body = token_json(token, 3600);
    server.mock(|when, then| {
        when.method(POST)
            .path(TOKEN_ENDPOINT)
            .header("content-type", "application/x-www-form-urlencoded")
            .header_missing("authorization")
            .body(TOKEN_FORM);
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

/// Records the access tokens handed to the update callback.
fn recording_callback(client: &mut HelloFlexClient) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    client.set_update_token_callback(move |token: &Token| {
        sink.lock()
            .expect("callback lock")
            .push(token.access_token().to_string());
        Ok::<_, Infallible>(())
    });
    seen
}

#[tokio::test]
async fn should_request_token_before_first_call() {
    let server = MockServer::start();
    let token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/jobs")
            .header("authorization", "Bearer tok1")
            .header("accept", "application/json")
            .header("cache-control", "no-cache");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"id":"job-1"}]"#);
    });

    let mut client = client_for(&server);
    let seen = recording_callback(&mut client);

    let jobs = client.get("/api/jobs").await.expect("jobs");

    assert_eq!(jobs, Some(json!([{"id": "job-1"}])));
    token_mock.assert_calls(1);
    api_mock.assert_calls(1);
    assert_eq!(*seen.lock().expect("callback lock"), vec!["tok1".to_string()]);

    let token = client.get_token().await.expect("token stored");
    assert_eq!(token.access_token(), "tok1");
    assert!(!token.is_expired());
}

#[tokio::test]
async fn should_reuse_valid_token() {
    let server = MockServer::start();
    let token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/jobs")
            .header("authorization", "Bearer tok1");
        then.status(200).body("[]");
    });

    let client = client_for(&server);
    client.get("/api/jobs").await.expect("first call");
    client.get("/api/jobs").await.expect("second call");

    token_mock.assert_calls(1);
    api_mock.assert_calls(2);
}

#[tokio::test]
async fn should_use_seeded_token_without_token_request() {
    let server = MockServer::start();
    let token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/candidates")
            .header("authorization", "Bearer seeded");
        then.status(200).body("[]");
    });

    let mut client = client_for(&server);
    let seen = recording_callback(&mut client);
    client
        .set_token(Token::from_expires_in("seeded", 3600).expect("expiry in range"))
        .await;

    client.get("/api/candidates").await.expect("candidates");

    token_mock.assert_calls(0);
    api_mock.assert_calls(1);
    assert!(seen.lock().expect("callback lock").is_empty());
}

#[tokio::test]
async fn should_refresh_expired_token() {
    let server = MockServer::start();
    let token_mock = token_mock(&server, "tok2");
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/agencies")
            .header("authorization", "Bearer tok2");
        then.status(200).body("[]");
    });

    let expired = Token::from_expires_in("stale", -60).expect("expiry in range");
    let client = HelloFlexClient::builder("a", "b")
        .with_base_url(server.base_url())
        .expect("valid base url")
        .with_token(expired)
        .build()
        .expect("should build client");

    client.get("/api/agencies").await.expect("agencies");

    token_mock.assert_calls(1);
    api_mock.assert_calls(1);
    let token = client.get_token().await.expect("token stored");
    assert_eq!(token.access_token(), "tok2");
}

#[tokio::test]
async fn should_refresh_once_for_concurrent_calls() {
    let server = MockServer::start();
    let token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/jobs")
            .header("authorization", "Bearer tok1");
        then.status(200).body("[]");
    });

    let client = client_for(&server);
    let (first, second) = tokio::join!(
        client.get("/api/jobs").into_future(),
        client.get("/api/jobs").into_future()
    );
    first.expect("first call");
    second.expect("second call");

    token_mock.assert_calls(1);
    api_mock.assert_calls(2);
}

#[tokio::test]
async fn should_track_total_count_of_last_request() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let _jobs_mock = server.mock(|when, then| {
        when.method(GET).path("/api/jobs");
        then.status(200).header("X-Total-Count", "42").body("[]");
    });
    let _publicjobs_mock = server.mock(|when, then| {
        when.method(GET).path("/api/publicjobs");
        then.status(200).body("[]");
    });

    let client = client_for(&server);

    client.get("/api/jobs").await.expect("jobs");
    assert_eq!(client.get_total_count().await, Some(42));

    client.get("/api/publicjobs").await.expect("public jobs");
    assert_eq!(client.get_total_count().await, None);
}

#[tokio::test]
async fn should_send_query_parameters() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/employers")
            .query_param("skip", "0")
            .query_param("take", "10");
        then.status(200).body("[]");
    });

    let client = client_for(&server);
    client
        .get("/api/employers")
        .query(&json!({"skip": 0, "take": 10}))
        .expect("object query")
        .await
        .expect("employers");

    api_mock.assert_calls(1);
}

#[tokio::test]
async fn should_send_json_body_by_default() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/jobs")
            .header("content-type", "application/json")
            .body(r#"{"title":"x"}"#);
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"id":"job-2","title":"x"}"#);
    });

    let client = client_for(&server);
    let created = client
        .post("/api/jobs")
        .json(&json!({"title": "x"}))
        .expect("json body")
        .await
        .expect("created job");

    api_mock.assert_calls(1);
    assert_eq!(created, Some(json!({"id": "job-2", "title": "x"})));
}

#[tokio::test]
async fn should_send_empty_json_array_for_post_without_data() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/jobs/job-2/publish")
            .header("content-type", "application/json")
            .body("[]");
        then.status(204);
    });

    let client = client_for(&server);
    let published = client
        .post("/api/jobs/job-2/publish")
        .await
        .expect("published job");

    api_mock.assert_calls(1);
    assert_eq!(published, None);
}

#[tokio::test]
async fn should_send_form_body_when_requested() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/jobs/job-2")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("title=y");
        then.status(200).body(r#"{"id":"job-2","title":"y"}"#);
    });

    let client = client_for(&server);
    client
        .put("/api/jobs/job-2")
        .form(&json!({"title": "y"}))
        .expect("form body")
        .await
        .expect("updated job");

    api_mock.assert_calls(1);
}

#[tokio::test]
async fn should_decode_empty_body_as_none() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let _api_mock = server.mock(|when, then| {
        when.method(DELETE).path("/api/jobs/job-2");
        then.status(204);
    });

    let client = client_for(&server);
    let deleted = client.delete("/api/jobs/job-2").await.expect("deleted");

    assert_eq!(deleted, None);
}

#[tokio::test]
async fn should_report_malformed_body() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let _api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/jobs");
        then.status(200).body("<html>maintenance</html>");
    });

    let client = client_for(&server);
    let result = client.get("/api/jobs").await;

    assert!(matches!(result, Err(HelloFlexError::JsonError { .. })));
}

#[tokio::test]
async fn should_report_non_success_status() {
    let server = MockServer::start();
    let _token_mock = token_mock(&server, "tok1");
    let _api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/jobs/unknown");
        then.status(404).body(r#"{"message":"not found"}"#);
    });

    let client = client_for(&server);
    let result = client.get("/api/jobs/unknown").await;

    match result {
        Err(HelloFlexError::UnexpectedStatusCode { status_code, body }) => {
            assert_eq!(status_code, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("Expected UnexpectedStatusCode, got {other:?}"),
    }
}

#[tokio::test]
async fn should_not_call_api_when_token_request_fails() {
    let server = MockServer::start();
    let token_mock = server.mock(|when, then| {
        when.method(POST).path(TOKEN_ENDPOINT);
        then.status(401).body(r#"{"error":"invalid_client"}"#);
    });
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/jobs");
        then.status(200).body("[]");
    });

    let client = client_for(&server);
    let result = client.get("/api/jobs").await;

    assert!(matches!(
        result,
        Err(HelloFlexError::UnexpectedStatusCode {
            status_code: 401,
            ..
        })
    ));
    token_mock.assert_calls(1);
    api_mock.assert_calls(0);
    assert!(client.get_token().await.is_none());
}

#[tokio::test]
async fn should_reject_token_response_without_access_token() {
    let server = MockServer::start();
    let _token_mock = server.mock(|when, then| {
        when.method(POST).path(TOKEN_ENDPOINT);
        then.status(200).body(r#"{"token_type":"Bearer"}"#);
    });

    let client = client_for(&server);
    let result = client.request_access_token().await;

    assert!(matches!(
        result,
        Err(HelloFlexError::InvalidTokenResponse { .. })
    ));
}

#[tokio::test]
async fn should_propagate_callback_error_and_keep_token() {
    let server = MockServer::start();
    let token_mock = token_mock(&server, "tok1");
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/jobs")
            .header("authorization", "Bearer tok1");
        then.status(200).body("[]");
    });

    let mut client = client_for(&server);
    client.set_update_token_callback(|_: &Token| Err(std::io::Error::other("store unavailable")));

    let result = client.get("/api/jobs").await;

    match result {
        Err(HelloFlexError::TokenCallbackFailed { source }) => {
            assert_eq!(source.to_string(), "store unavailable");
        }
        other => panic!("Expected TokenCallbackFailed, got {other:?}"),
    }
    api_mock.assert_calls(0);

    // the token was stored before the callback ran
    client.get("/api/jobs").await.expect("second call");
    token_mock.assert_calls(1);
    api_mock.assert_calls(1);
}

#[tokio::test]
async fn should_request_access_token_explicitly() {
    let server = MockServer::start();
    let token_mock = token_mock(&server, "tok1");

    let mut client = client_for(&server);
    let seen = recording_callback(&mut client);

    let token = client.request_access_token().await.expect("token");

    assert_eq!(token.access_token(), "tok1");
    assert_eq!(client.get_token().await, Some(token));
    token_mock.assert_calls(1);
    assert_eq!(seen.lock().expect("callback lock").len(), 1);
}
