use std::time::Duration;

use anyhow::{Context, Result};

use crate::sync::poller::PollConfig;

/// Client configuration loaded from environment variables.
/// Fails at startup if the backend URL is missing: nothing works without it.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub poll: PollConfig,
    pub rust_log: String,
    /// Static identity used by the headless binary.
    pub identity: Option<StaticIdentity>,
}

#[derive(Debug, Clone)]
pub struct StaticIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_base_url = require_env("DISHA_API_BASE_URL")?;

        let identity = match std::env::var("DISHA_UID") {
            Ok(uid) => Some(StaticIdentity {
                uid,
                email: std::env::var("DISHA_EMAIL").ok(),
                id_token: require_env("DISHA_ID_TOKEN")?,
            }),
            Err(_) => None,
        };

        let defaults = PollConfig::default();

        Ok(Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 30)?),
            poll: PollConfig {
                interval: Duration::from_secs(parse_env(
                    "POLL_INTERVAL_SECS",
                    defaults.interval.as_secs(),
                )?),
                max_attempts: parse_env("POLL_MAX_ATTEMPTS", defaults.max_attempts)?,
                backoff_factor: parse_env("POLL_BACKOFF_FACTOR", defaults.backoff_factor)?,
                max_interval: Duration::from_secs(parse_env(
                    "POLL_MAX_INTERVAL_SECS",
                    defaults.max_interval.as_secs(),
                )?),
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            identity,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}
