use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenManager;
use crate::config::Config;
use crate::services::rate_limiter::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenManager>,
    pub rate_limiter: RateLimiter,
    pub frontend_url: String,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            tokens: Arc::new(TokenManager::new(&config.jwt_secret, config.jwt_ttl)),
            rate_limiter: RateLimiter::new(
                config.rate_limit_max_requests,
                config.rate_limit_window,
            )
            .with_trusted_proxy(config.trust_proxy),
            frontend_url: config.frontend_url.clone(),
        }
    }
}
