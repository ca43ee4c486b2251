// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::env;
use std::time::Duration;

use tracing::warn;

// Where the backend listens when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 20;

pub const ENV_API_URL: &str = "TASKBOARD_API_URL";
pub const ENV_WS_URL: &str = "TASKBOARD_WS_URL";
pub const ENV_TOKEN: &str = "TASKBOARD_TOKEN";
pub const ENV_RECONNECT_SECS: &str = "TASKBOARD_RECONNECT_SECS";
pub const ENV_RECONNECT_ATTEMPTS: &str = "TASKBOARD_RECONNECT_ATTEMPTS";

/// Runtime settings of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// Live update endpoint.
    pub ws_url: String,
    /// Credential sent in the `Authorization` header. `None` means logged out.
    pub token: Option<String>,
    pub reconnect_interval: Duration,
    pub reconnect_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_api_url(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Settings for a backend at `api_url`, with the live channel next to it.
    pub fn for_api_url(api_url: &str) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        Self {
            ws_url: derive_ws_url(&api_url),
            api_url,
            token: None,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Reads the `TASKBOARD_*` environment variables, falling back to defaults.
    /// Unparseable numbers are logged and replaced by their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::for_api_url(&api_url);

        if let Some(ws_url) = get(ENV_WS_URL) {
            config.ws_url = ws_url;
        }
        config.token = get(ENV_TOKEN);

        if let Some(raw) = get(ENV_RECONNECT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.reconnect_interval = Duration::from_secs(secs),
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_RECONNECT_SECS, raw, e),
            }
        }
        if let Some(raw) = get(ENV_RECONNECT_ATTEMPTS) {
            match raw.trim().parse::<u32>() {
                Ok(attempts) => config.reconnect_attempts = attempts,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_RECONNECT_ATTEMPTS, raw, e),
            }
        }

        config
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// `http://host` becomes `ws://host/ws`, `https://host` becomes `wss://host/ws`.
fn derive_ws_url(api_url: &str) -> String {
    let base = match api_url.strip_prefix("http") {
        Some(rest) => format!("ws{rest}"),
        None => api_url.to_string(),
    };
    format!("{base}/ws")
}
