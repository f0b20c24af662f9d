use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::resume::DEFAULT_RESUME_MAX_CHARS;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub xai_api_key: String,
    pub xai_base_url: String,
    pub generation_model: String,
    /// Passed to reasoning models as `reasoning_effort` (`low` or `high`) when set.
    pub reasoning_effort: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Wall-clock limit for one chat turn, measured from request arrival.
    pub turn_timeout: Duration,
    /// Resume text beyond this many characters is cut before assembly.
    pub resume_max_chars: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            xai_api_key: require_env("XAI_API_KEY")?,
            xai_base_url: std::env::var("XAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            generation_model: std::env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            reasoning_effort: optional_env("REASONING_EFFORT"),
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            turn_timeout: Duration::from_secs(
                parse_env("TURN_TIMEOUT_SECS", 30u64)
                    .context("TURN_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            resume_max_chars: parse_env("RESUME_MAX_CHARS", DEFAULT_RESUME_MAX_CHARS)
                .context("RESUME_MAX_CHARS must be a positive integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
