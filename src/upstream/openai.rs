//! OpenAI-compatible upstream client
//!
//! Streams chat completions from `{base_url}/chat/completions` and probes the
//! credential with `GET {base_url}/models`, bounded by the configured probe
//! timeout. Non-success responses are turned into [`UpstreamFailure`] values
//! carrying the HTTP status and the parsed error envelope.

use super::{ChatStream, StreamError, UpstreamClient, UpstreamFailure};
use crate::config::UpstreamConfig;
use crate::credentials::ApiKey;
use crate::validation::ChatMessage;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// `reqwest`-backed client for OpenAI-compatible chat APIs
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<ApiKey>,
    probe_timeout: Duration,
}

impl OpenAiClient {
    /// Create a client for the configured base URL
    ///
    /// A missing key is allowed here; the credential gate rejects requests
    /// before the client is used.
    pub fn new(config: &UpstreamConfig, api_key: Option<ApiKey>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds()))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
            probe_timeout: Duration::from_secs(config.probe_timeout_seconds()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key.expose()),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamFailure> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| UpstreamFailure::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(
                    upstream_status = status.as_u16(),
                    error = %e,
                    "Failed to read upstream error body"
                );
                String::new()
            }
        };
        Err(UpstreamFailure::http(status.as_u16(), &body))
    }
}

#[async_trait]
impl UpstreamClient for OpenAiClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatStream, UpstreamFailure> {
        let payload = ChatCompletionRequest {
            model,
            messages,
            stream: true,
        };

        let request = self
            .http
            .post(self.url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&payload);

        let response = self.send(request).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| StreamError(e.to_string())))
            .boxed())
    }

    async fn probe(&self) -> Result<(), UpstreamFailure> {
        let request = self
            .http
            .get(self.url("models"))
            .timeout(self.probe_timeout);
        self.send(request).await.map(|_| ())
    }
}
