//! HTTP implementation of the task API.

use crate::api::error::ApiError;
use crate::config::ServerConfig;
use crate::models::{Envelope, StatusReport, SubmitResponse, Task};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Operations the tracker needs from the analysis service.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Post form fields to the start-analysis endpoint; returns the new task id.
    async fn start_analysis(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<String, ApiError>;

    /// `GET /api/tasks/{id}/status`
    async fn task_status(&self, task_id: &str) -> Result<StatusReport, ApiError>;

    /// `POST /api/tasks/{id}/cancel`; returns the backend's message, if any.
    async fn cancel_task(&self, task_id: &str) -> Result<Option<String>, ApiError>;

    /// `GET /api/tasks/{id}`: the full task document, result included.
    async fn task(&self, task_id: &str) -> Result<Task, ApiError>;
}

/// `reqwest`-backed client for the analysis service.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    base_url: String,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl HttpTaskApi {
    /// Create a client for the service described by `config`.
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_endpoint(&self, task_id: &str, suffix: &str) -> String {
        format!(
            "{}/api/tasks/{}{}",
            self.base_url,
            urlencoding::encode(task_id),
            suffix
        )
    }

    /// Resolve a form action: absolute URLs are kept, paths are joined to the base URL.
    pub fn resolve_action(&self, action: &str) -> String {
        if action.starts_with("http://") || action.starts_with("https://") {
            action.to_string()
        } else {
            format!("{}/{}", self.base_url, action.trim_start_matches('/'))
        }
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(&e, &self.base_url, self.timeout_seconds))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(&e, &self.base_url, self.timeout_seconds))?;

        debug!("Response {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }

        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn start_analysis(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<String, ApiError> {
        let url = self.resolve_action(action);
        debug!("POST {} with {} form fields", url, fields.len());

        let body = self.send(self.http_client.post(&url).form(fields)).await?;
        let response: SubmitResponse = Self::decode(&body)?;

        match response.task_id {
            Some(task_id) => Ok(task_id),
            None => Err(ApiError::Rejected(
                response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "No task id in response".to_string()),
            )),
        }
    }

    async fn task_status(&self, task_id: &str) -> Result<StatusReport, ApiError> {
        let url = self.task_endpoint(task_id, "/status");
        debug!("GET {}", url);

        let body = self.send(self.http_client.get(&url)).await?;
        Self::decode(&body)
    }

    async fn cancel_task(&self, task_id: &str) -> Result<Option<String>, ApiError> {
        let url = self.task_endpoint(task_id, "/cancel");
        debug!("POST {}", url);

        let body = self.send(self.http_client.post(&url)).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope = Self::decode(&body)?;
        if envelope.is_failure() {
            return Err(ApiError::Rejected(
                envelope.text().unwrap_or("Cancel request failed").to_string(),
            ));
        }

        Ok(envelope.message)
    }

    async fn task(&self, task_id: &str) -> Result<Task, ApiError> {
        let url = self.task_endpoint(task_id, "");
        debug!("GET {}", url);

        let body = self.send(self.http_client.get(&url)).await?;
        Self::decode(&body)
    }
}
