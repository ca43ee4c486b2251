// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use async_trait::async_trait;
use common::{ApiErrorBody, CreateTaskPayload, Task, UpdateTaskPayload};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// CRUD access to the task collection of the current principal.
///
/// The board only ever talks to this trait, so tests can stand in a scripted
/// backend without a network.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Whether calls will carry a credential. Unauthenticated boards never fetch.
    fn has_credential(&self) -> bool {
        true
    }

    async fn list(&self) -> Result<Vec<Task>, ApiError>;

    async fn create(&self, payload: &CreateTaskPayload) -> Result<Task, ApiError>;

    async fn update(&self, id: i64, payload: &UpdateTaskPayload) -> Result<Task, ApiError>;

    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

/// `TaskApi` over the backend's REST routes.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTaskApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Reuses an existing `reqwest::Client` (and its connection pool).
    pub fn with_client(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.api_url.clone(),
            token: config.token.clone(),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    fn task_url(&self, id: i64) -> String {
        format!("{}/api/tasks/{}", self.base_url, id)
    }

    // The backend reads the raw token from `Authorization`, without a scheme prefix.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, token),
            None => request,
        }
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        debug!("Fetching task collection from {}", self.tasks_url());
        let response = self.authorized(self.http.get(self.tasks_url())).send().await?;
        let tasks: Vec<Task> = ensure_success(response).await?.json().await?;
        info!("Successfully retrieved {} tasks.", tasks.len());
        Ok(tasks)
    }

    async fn create(&self, payload: &CreateTaskPayload) -> Result<Task, ApiError> {
        debug!("Creating task titled {:?}", payload.title);
        let response = self
            .authorized(self.http.post(self.tasks_url()))
            .json(payload)
            .send()
            .await?;
        let task: Task = ensure_success(response).await?.json().await?;
        info!("Task created successfully with ID: {}", task.id);
        Ok(task)
    }

    async fn update(&self, id: i64, payload: &UpdateTaskPayload) -> Result<Task, ApiError> {
        debug!("Updating task {} with {:?}", id, payload);
        let response = self
            .authorized(self.http.put(self.task_url(id)))
            .json(payload)
            .send()
            .await?;
        let task: Task = ensure_success(response).await?.json().await?;
        info!("Task with ID {} updated successfully.", id);
        Ok(task)
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        debug!("Attempting to delete task with ID: {}", id);
        let response = self
            .authorized(self.http.delete(self.task_url(id)))
            .send()
            .await?;
        ensure_success(response).await?;
        info!("Task with ID {} deleted successfully.", id);
        Ok(())
    }
}

/// Turns a non-2xx response into `ApiError::Rejected`, keeping the server's
/// `{"error": ...}` message when there is one.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    error!(
        "Request rejected: status_code={}, message={}",
        status.as_u16(),
        message
    );
    Err(ApiError::Rejected { status, message })
}
