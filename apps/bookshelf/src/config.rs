use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every service binary shares this shape; each one only reads the URLs it needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub shared_service_url: String,
    pub book_service_url: String,
    pub summary_service_url: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_max_tokens: u32,
    pub outbound_timeout: Duration,
    pub audit_forwarding: bool,
}

impl Config {
    /// Loads from the process environment. `default_port` is the service's own port.
    pub fn from_env(default_port: u16) -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(default_port, |key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(default_port: u16, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            database_url: lookup("DATABASE_URL")
                .context("Required environment variable 'DATABASE_URL' is not set")?,
            port: var("PORT", &default_port.to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
            shared_service_url: trim_url(var("SHARED_SERVICE_URL", "http://localhost:8000")),
            book_service_url: trim_url(var("BOOK_SERVICE_URL", "http://localhost:8001")),
            summary_service_url: trim_url(var("SUMMARY_SERVICE_URL", "http://localhost:8003")),
            llm_api_url: trim_url(var("LLM_API_URL", "http://localhost:11434")),
            llm_model: var("LLM_MODEL", "llama3"),
            llm_api_key: lookup("LLM_API_KEY").filter(|k| !k.trim().is_empty()),
            llm_max_tokens: var("LLM_MAX_TOKENS", "512")
                .parse::<u32>()
                .context("LLM_MAX_TOKENS must be a positive integer")?,
            outbound_timeout: Duration::from_secs(
                var("OUTBOUND_TIMEOUT_SECS", "5")
                    .parse::<u64>()
                    .context("OUTBOUND_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            audit_forwarding: var("AUDIT_FORWARDING", "true")
                .parse::<bool>()
                .context("AUDIT_FORWARDING must be 'true' or 'false'")?,
        })
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
