use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context};

/// Runtime configuration, read from the environment once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    pub frontend_url: String,
    pub jwt_secret: String,
    pub jwt_ttl: chrono::Duration,
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,
    /// Key rate limits on `X-Forwarded-For` instead of the peer address.
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let port: u16 = parse_var("PORT", 3002)?;
        let jwt_days: i64 = parse_var("JWT_EXPIRES_IN_DAYS", 7)?;
        let window_ms: u64 = parse_var("RATE_LIMIT_WINDOW_MS", 900_000)?;

        let config = Self {
            database_url,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            jwt_secret,
            jwt_ttl: chrono::Duration::days(jwt_days),
            rate_limit_window: Duration::from_millis(window_ms),
            rate_limit_max_requests: parse_var("RATE_LIMIT_MAX_REQUESTS", 100)?,
            trust_proxy: parse_var("TRUST_PROXY", false)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 bytes long");
        }
        if self.jwt_ttl <= chrono::Duration::zero() {
            bail!("JWT_EXPIRES_IN_DAYS must be positive");
        }
        if self.rate_limit_max_requests == 0 {
            bail!("RATE_LIMIT_MAX_REQUESTS must be greater than zero");
        }
        if self.rate_limit_window.is_zero() {
            bail!("RATE_LIMIT_WINDOW_MS must be greater than zero");
        }
        url::Url::parse(&self.frontend_url)
            .with_context(|| format!("FRONTEND_URL is not a valid URL: {}", self.frontend_url))?;
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {} ({})", name, raw, e)),
        Err(_) => Ok(default),
    }
}
