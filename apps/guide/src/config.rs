use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend, e.g. `https://xyz.supabase.co`.
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub port: u16,
    pub rust_log: String,
    pub request_timeout_secs: u64,
    /// Offset used for "local" day boundaries when a request does not send one.
    pub default_utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let supabase_url = require_env("SUPABASE_URL")?;

        Ok(Config {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            port: optional_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            request_timeout_secs: optional_env("REQUEST_TIMEOUT_SECS", 30)
                .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            default_utc_offset_minutes: optional_env("DEFAULT_UTC_OFFSET_MINUTES", 0)
                .context("DEFAULT_UTC_OFFSET_MINUTES must be an integer")?,
        })
    }

    /// The configured default offset, falling back to UTC when out of range.
    pub fn default_offset(&self) -> FixedOffset {
        offset_from_minutes(self.default_utc_offset_minutes)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Converts minutes east of UTC into a `FixedOffset`. `None` when beyond ±24h.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for '{key}': {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        supabase_url: "http://localhost:54321".to_string(),
        supabase_anon_key: "anon-key".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        request_timeout_secs: 5,
        default_utc_offset_minutes: 0,
    }
}
