//! Client configuration loaded from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use game_api::{GameApi, RetryPolicy};
use roleverse_core::AnimationOptions;

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Runtime settings for the terminal client.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub typing_speed: Duration,
    pub paragraph_pause: Duration,
    pub retry_attempts: u32,
    pub health_interval: Duration,
    pub request_timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let animation = AnimationOptions::default();
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            typing_speed: animation.base_speed,
            paragraph_pause: animation.paragraph_pause,
            retry_attempts: RetryPolicy::default().max_attempts,
            health_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            log_dir: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ROLEVERSE_API_URL` - Game server base URL (default: http://localhost:8000)
    /// - `ROLEVERSE_TYPING_SPEED_MS` - Delay per revealed character (default: 25)
    /// - `ROLEVERSE_PARAGRAPH_PAUSE_MS` - Pause between paragraphs (default: 200)
    /// - `ROLEVERSE_RETRY_ATTEMPTS` - Attempts per request (default: 3)
    /// - `ROLEVERSE_HEALTH_INTERVAL_SECS` - Server health poll period (default: 30)
    /// - `ROLEVERSE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
    /// - `ROLEVERSE_LOG_DIR` - Log directory (default: platform-specific)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("ROLEVERSE_API_URL").filter(|url| !url.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }
        if let Some(ms) = parse::<u64>(&lookup, "ROLEVERSE_TYPING_SPEED_MS") {
            config.typing_speed = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, "ROLEVERSE_PARAGRAPH_PAUSE_MS") {
            config.paragraph_pause = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse::<u32>(&lookup, "ROLEVERSE_RETRY_ATTEMPTS") {
            config.retry_attempts = attempts.max(1);
        }
        if let Some(secs) = parse::<u64>(&lookup, "ROLEVERSE_HEALTH_INTERVAL_SECS") {
            config.health_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = parse::<u64>(&lookup, "ROLEVERSE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        config.log_dir = lookup("ROLEVERSE_LOG_DIR").map(PathBuf::from);

        config
    }

    pub fn animation_options(&self) -> AnimationOptions {
        AnimationOptions {
            base_speed: self.typing_speed,
            paragraph_pause: self.paragraph_pause,
        }
    }

    /// HTTP client for the configured server.
    pub fn client(&self) -> Result<GameApi, game_api::Error> {
        let retry = RetryPolicy::default().with_max_attempts(self.retry_attempts);
        Ok(GameApi::with_timeout(&self.api_url, self.request_timeout)?.with_retry(retry))
    }

    /// Where log files go.
    pub fn log_directory(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_directory)
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

/// Get the platform-specific log directory
fn default_log_directory() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Caches/roleverse/logs");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(cache) = env::var_os("XDG_CACHE_HOME") {
            return PathBuf::from(cache).join("roleverse/logs");
        }
        if let Some(home) = env::var_os("HOME") {
            return PathBuf::from(home).join(".cache/roleverse/logs");
        }
    }

    env::temp_dir().join("roleverse").join("logs")
}
