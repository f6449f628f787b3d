//! reqwest-backed implementation of [`RemoteApi`].

use super::{decode_event_stream, ControlRequest, EventStream, LogEntry, RemoteApi};
use crate::error::ApiError;
use crate::types::Agent;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Client for the coder server's HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Unary requests, bounded by the configured timeout.
    http: reqwest::Client,
    /// Long-lived requests (event stream, control long poll) without a
    /// whole-request timeout.
    streaming: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url` with `timeout` applied to unary calls.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let streaming = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            streaming,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        client: &reqwest::Client,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = client.get(self.url(path)).send().await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|err| ApiError::InvalidResponse(format!("GET {path}: {err}")))
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Map non-2xx responses to [`ApiError::Status`] with the body attached.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    Err(ApiError::Status {
        code: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteApi for ApiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_agents(&self) -> Result<Option<Vec<Agent>>, ApiError> {
        self.get_json(&self.http, "agent").await
    }

    async fn open_event_stream(&self) -> Result<EventStream, ApiError> {
        let response = self
            .streaming
            .get(self.url("event"))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(decode_event_stream(response.bytes_stream()))
    }

    async fn next_control_request(&self) -> Result<ControlRequest, ApiError> {
        self.get_json(&self.streaming, "tui/control/next").await
    }

    async fn reply_control(&self, body: &serde_json::Value) -> Result<(), ApiError> {
        self.post_json("tui/control/response", body).await
    }

    async fn write_log(&self, entry: &LogEntry) -> Result<(), ApiError> {
        self.post_json("log", entry).await
    }
}
