//! Minimal RoleVerse game server client.
//!
//! This crate provides a focused client for the game server's JSON API with:
//! - One typed method per endpoint
//! - Retry with exponential backoff for transient failures
//! - Wire types shared with the session layer

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the game server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            Error::Parse(_) | Error::Config(_) => false,
        }
    }
}

/// How failed requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Backoff to wait after the given (1-based) failed attempt.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Game server API client.
#[derive(Clone)]
pub struct GameApi {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GameApi {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client for the default local server.
    pub fn local() -> Result<Self, Error> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Set the retry policy for this client.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Open a new game session.
    pub async fn start_game(&self) -> Result<StartGameResponse, Error> {
        self.post("/api/start-game", &serde_json::json!({})).await
    }

    /// Select a universe (preset or custom) for the session.
    pub async fn choose_universe(
        &self,
        request: &ChooseUniverseRequest,
    ) -> Result<ChooseUniverseResponse, Error> {
        self.post("/api/choose-universe", request).await
    }

    /// Create the player character and receive the opening story.
    pub async fn create_character(
        &self,
        request: &CreateCharacterRequest,
    ) -> Result<CreateCharacterResponse, Error> {
        self.post("/api/create-character", request).await
    }

    /// Perform a free-text player action.
    pub async fn action(&self, request: &ActionRequest) -> Result<ActionResponse, Error> {
        self.post("/api/action", request).await
    }

    /// Fetch the current character status.
    pub async fn get_status(&self, request: &SessionRequest) -> Result<StatusResponse, Error> {
        self.post("/api/get-status", request).await
    }

    /// Ask the server for an opaque save blob.
    pub async fn save_game(&self, request: &SessionRequest) -> Result<SaveGameResponse, Error> {
        self.post("/api/save-game", request).await
    }

    /// Restore a session from a save blob previously returned by `save_game`.
    pub async fn load_game(&self, request: &LoadGameRequest) -> Result<LoadGameResponse, Error> {
        self.post("/api/load-game", request).await
    }

    /// Poll server health. Never retried; it is polled periodically anyway.
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        let request = self.client.get(self.url("/health"));
        send_once(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let mut attempt = 1;

        loop {
            tracing::debug!(endpoint = path, attempt, "sending request");
            let request = self.client.post(&url).json(body);

            match send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff_after(attempt);
                    tracing::warn!(
                        endpoint = path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(endpoint = path, attempt, error = %e, "request failed");
                    return Err(e);
                }
            }
        }
    }
}

async fn send_once<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, Error> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Api {
            status,
            message: body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| Error::Parse(e.to_string()))
}

// ============================================================================
// Wire types
// ============================================================================

/// Character attributes as sent by the server (name → value).
pub type Stats = BTreeMap<String, serde_json::Value>;

/// Body for endpoints that only need the session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub user_id: String,
}

impl SessionRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// A universe advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartGameResponse {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub universes: Vec<UniverseSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChooseUniverseRequest {
    pub user_id: String,
    pub universe_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChooseUniverseResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub need_character: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCharacterRequest {
    pub user_id: String,
    pub character_prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCharacterResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub game_started: bool,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub health: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub user_id: String,
    pub action: String,
}

/// Result of a player action.
///
/// On failure the server sends `{ success: false, message }` and leaves the
/// remaining fields out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub action_result: Option<String>,
    #[serde(default)]
    pub new_items: Vec<String>,
    #[serde(default)]
    pub chance: Option<f64>,
    #[serde(default)]
    pub rolled: Option<f64>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub game_over: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub health: Option<i32>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub world_context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveGameResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub save_data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadGameRequest {
    pub user_id: String,
    pub save_data: serde_json::Value,
}

/// Game state restored by `load_game`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub health: Option<i32>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub world_context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadGameResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub game_data: Option<GameData>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub active_sessions: u64,
    #[serde(default)]
    pub ai_available: bool,
}
