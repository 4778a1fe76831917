//! Shared helpers for integration tests
//!
//! `MockUpstream` stands in for the LLM provider so tests are hermetic and
//! can count exactly how many probe and chat calls were made.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response},
};
use chatgate::{
    config::Config,
    credentials::ApiKey,
    handlers::{self, AppState},
    upstream::{ChatStream, StreamError, UpstreamClient, UpstreamFailure},
    validation::ChatMessage,
};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const VALID_KEY: &str = "sk-test-0123456789abcdefghij";

pub const SSE_BODY: &[&str] = &[
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
    "data: [DONE]\n\n",
];

/// Scripted upstream provider
#[derive(Default)]
pub struct MockUpstream {
    probe_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    probe_delay: Duration,
    probe_failures: Mutex<VecDeque<UpstreamFailure>>,
    chat_failures: Mutex<VecDeque<UpstreamFailure>>,
    last_messages: Mutex<Vec<ChatMessage>>,
    break_mid_stream: bool,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every probe so concurrent callers overlap
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    /// Fail the next probe with the given failure (queued, FIFO)
    pub fn fail_probe(self, failure: UpstreamFailure) -> Self {
        self.probe_failures.lock().unwrap().push_back(failure);
        self
    }

    /// Fail the next chat call with the given failure (queued, FIFO)
    pub fn fail_chat(self, failure: UpstreamFailure) -> Self {
        self.chat_failures.lock().unwrap().push_back(failure);
        self
    }

    /// Emit an error after the first chunk of every stream
    pub fn break_mid_stream(mut self) -> Self {
        self.break_mid_stream = true;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn stream_chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatStream, UpstreamFailure> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();

        if let Some(failure) = self.chat_failures.lock().unwrap().pop_front() {
            return Err(failure);
        }

        let chunks: Vec<Result<Bytes, StreamError>> = if self.break_mid_stream {
            vec![
                Ok(Bytes::from_static(SSE_BODY[0].as_bytes())),
                Err(StreamError("connection reset".to_string())),
            ]
        } else {
            SSE_BODY
                .iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect()
        };

        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn probe(&self) -> Result<(), UpstreamFailure> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if !self.probe_delay.is_zero() {
            tokio::time::sleep(self.probe_delay).await;
        }
        match self.probe_failures.lock().unwrap().pop_front() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// Build state around a mock upstream with the given key
pub fn create_state(key: Option<&str>, upstream: Arc<MockUpstream>) -> AppState {
    create_state_with_config(Config::default(), key, upstream)
}

pub fn create_state_with_config(
    config: Config,
    key: Option<&str>,
    upstream: Arc<MockUpstream>,
) -> AppState {
    AppState::with_upstream(Arc::new(config), key.map(ApiKey::new), upstream)
        .expect("AppState should build")
}

pub fn create_app(state: AppState) -> Router {
    handlers::router(state)
}

pub fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn hello_request() -> Request<Body> {
    chat_request(r#"{"messages":[{"role":"user","content":"hi"}]}"#)
}

/// Send one request through a fresh clone of the router
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("error body should be JSON")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
