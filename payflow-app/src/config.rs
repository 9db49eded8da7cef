//! Configuration loading from environment.

use std::env;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Base URL tokens are minted against, as payers reach the service.
    pub public_base_url: String,
    /// Raw admin key for the gateway routes. Unset disables them.
    pub admin_api_key: Option<String>,
    pub rate_limit_per_minute: u32,
    /// Set when a reverse proxy overwrites `X-Forwarded-For`.
    pub trust_forwarded_for: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));
        url::Url::parse(&public_base_url)
            .map_err(|e| anyhow::anyhow!("PUBLIC_BASE_URL is not a valid URL: {}", e))?;

        let admin_api_key = env::var("ADMIN_API_KEY").ok().filter(|k| !k.is_empty());

        let rate_limit_per_minute = env::var("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()?;

        let trust_forwarded_for = env::var("TRUST_FORWARDED_FOR")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            port,
            database_url,
            public_base_url,
            admin_api_key,
            rate_limit_per_minute,
            trust_forwarded_for,
        })
    }
}
