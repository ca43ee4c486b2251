// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use common::{SuggestRequest, SuggestResponse, Task};
use reqwest::Client;
use tracing::{debug, error, info};

use crate::api::ensure_success;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::prompt;

pub const NO_SUGGESTIONS: &str = "No suggestions returned.";
pub const SUGGESTION_ERROR: &str = "Error fetching suggestions. Please try again.";

/// Free-text prompt in, free-text suggestions out.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Fails with `ApiError::Empty` when the service answered without a suggestion.
    async fn suggest(&self, prompt: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpSuggestionService {
    http: Client,
    url: String,
}

impl HttpSuggestionService {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            url: format!("{}/api/ai/suggest", config.api_url),
        }
    }
}

#[async_trait]
impl SuggestionService for HttpSuggestionService {
    async fn suggest(&self, prompt: &str) -> Result<String, ApiError> {
        debug!("Requesting suggestions for a {} character prompt", prompt.len());
        let request = SuggestRequest {
            prompt: prompt.to_string(),
        };
        let response = self.http.post(&self.url).json(&request).send().await?;
        let reply: SuggestResponse = ensure_success(response).await?.json().await?;

        match reply.suggestions {
            Some(text) if !text.trim().is_empty() => {
                info!("Received {} characters of suggestions.", text.len());
                Ok(text)
            }
            _ => Err(ApiError::Empty),
        }
    }
}

/// State of the "ask for suggestions" panel.
pub struct Assistant {
    service: Arc<dyn SuggestionService>,
    prompt: String,
    suggestions: Option<String>,
    error: Option<String>,
}

impl Assistant {
    pub fn new(service: Arc<dyn SuggestionService>) -> Self {
        Self {
            service,
            prompt: String::new(),
            suggestions: None,
            error: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Prefills the prompt from `task`.
    pub fn ask_about(&mut self, task: &Task) {
        self.prompt = prompt::synthesize(task, &Local);
    }

    pub fn suggestions(&self) -> Option<&str> {
        self.suggestions.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sends the current prompt. The outcome lands in `suggestions` or `error`.
    pub async fn submit(&mut self) {
        self.suggestions = None;
        self.error = None;

        match self.service.suggest(&self.prompt).await {
            Ok(text) => self.suggestions = Some(text),
            Err(ApiError::Empty) => self.suggestions = Some(NO_SUGGESTIONS.to_string()),
            Err(err) => {
                error!("Error fetching suggestions: {}", err);
                self.error = Some(SUGGESTION_ERROR.to_string());
            }
        }
    }
}
