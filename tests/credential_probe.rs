//! Concurrency tests for the credential probe
//!
//! Verifies single-flight behavior under concurrent first requests and the
//! retry behavior after a failed probe, through the HTTP surface.

mod common;

use axum::http::StatusCode;
use chatgate::upstream::UpstreamFailure;
use common::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_requests_share_one_probe() {
    let upstream = Arc::new(MockUpstream::new().with_probe_delay(Duration::from_millis(150)));
    let app = create_app(create_state(Some(VALID_KEY), upstream.clone()));

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { send(&app, hello_request()).await.status() })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(upstream.probe_calls(), 1, "exactly one probe expected");
    assert_eq!(upstream.chat_calls(), 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_observe_same_probe_failure() {
    let upstream = Arc::new(
        MockUpstream::new()
            .with_probe_delay(Duration::from_millis(150))
            .fail_probe(UpstreamFailure::http(401, "")),
    );
    let state = create_state(Some(VALID_KEY), upstream.clone());
    let app = create_app(state.clone());

    let responses = futures::future::join_all((0..10).map(|_| {
        let app = app.clone();
        async move {
            let response = send(&app, hello_request()).await;
            let status = response.status();
            (status, body_json(response).await)
        }
    }))
    .await;

    for (status, body) in responses {
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["error"],
            "Service authentication error. Please try again later."
        );
    }
    assert_eq!(upstream.probe_calls(), 1);
    assert_eq!(upstream.chat_calls(), 0);
    assert_eq!(state.gate().state().as_str(), "untested");
}

#[tokio::test]
async fn test_failed_probe_is_retried_once_by_next_request() {
    let upstream = Arc::new(MockUpstream::new().fail_probe(UpstreamFailure::http(401, "")));
    let state = create_state(Some(VALID_KEY), upstream.clone());
    let app = create_app(state.clone());

    let response = send(&app, hello_request()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(upstream.probe_calls(), 1);

    let response = send(&app, hello_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(upstream.probe_calls(), 2);
    assert_eq!(state.gate().state().as_str(), "tested");

    assert_eq!(state.metrics().probe_count(), 2);
}

#[tokio::test]
async fn test_probe_rate_limit_is_reported_as_rate_limit() {
    let upstream = Arc::new(MockUpstream::new().fail_probe(UpstreamFailure::http(
        429,
        r#"{"error":{"message":"Rate limit reached","code":"rate_limit_exceeded"}}"#,
    )));
    let app = create_app(create_state(Some(VALID_KEY), upstream));

    let response = send(&app, hello_request()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health_does_not_trigger_probe() {
    let upstream = Arc::new(MockUpstream::new());
    let app = create_app(create_state(Some(VALID_KEY), upstream.clone()));

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["credential_state"], "untested");
    assert_eq!(upstream.probe_calls(), 0);
}
