//! Application configuration loaded from environment variables.

use thiserror::Error;

/// A required environment variable was missing at startup.
#[derive(Debug, Error)]
#[error("missing required environment variable {0}")]
pub struct MissingVar(pub &'static str);

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string (required)
/// - `STRIPE_SECRET_KEY` — gateway API key (required)
/// - `STRIPE_WEBHOOK_SECRET` — webhook signing secret (required)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Missing gateway secrets or database URL are fatal: serving without
    /// them would mean accepting payments we cannot process or persist.
    pub fn from_env() -> Result<Self, MissingVar> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").map_err(|_| MissingVar("DATABASE_URL"))?,
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
                .map_err(|_| MissingVar("STRIPE_SECRET_KEY"))?,
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
                .map_err(|_| MissingVar("STRIPE_WEBHOOK_SECRET"))?,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
