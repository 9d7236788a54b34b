use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tokio::time::{Duration, Instant};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

const PRUNE_THRESHOLD: usize = 10_000;

/// Fixed-window request counter keyed by client address.
///
/// Each key gets `max_requests` per `window`; the window starts with the
/// key's first request and resets once it has fully elapsed. The key is the
/// peer address unless `trust_proxy` is set, in which case the first
/// `X-Forwarded-For` entry wins.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
    trust_proxy: bool,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_requests,
            window,
            trust_proxy: false,
        }
    }

    pub fn with_trusted_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.max_requests {
            let elapsed = now.saturating_duration_since(entry.started);
            return Decision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drops windows that have fully elapsed.
    pub fn prune(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

fn client_key(request: &Request<Body>, trust_proxy: bool) -> String {
    // Only meaningful behind a proxy that overwrites the header.
    if trust_proxy {
        if let Some(forwarded) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn enforce(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&request, state.rate_limiter.trust_proxy);
    if state.rate_limiter.tracked_clients() > PRUNE_THRESHOLD {
        state.rate_limiter.prune(Instant::now());
    }
    match state.rate_limiter.check(&key) {
        Decision::Allowed { .. } => Ok(next.run(request).await),
        Decision::Limited { retry_after } => {
            warn!("Rate limit exceeded for {}", key);
            // Round up so clients never retry a moment too early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            Err(AppError::RateLimited {
                retry_after_secs: secs.max(1),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check_at("1.2.3.4", now), Decision::Allowed { remaining: 2 });
        assert_eq!(limiter.check_at("1.2.3.4", now), Decision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at("1.2.3.4", now), Decision::Allowed { remaining: 0 });

        let later = now + Duration::from_secs(20);
        assert_eq!(
            limiter.check_at("1.2.3.4", later),
            Decision::Limited { retry_after: Duration::from_secs(40) }
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), Decision::Limited { .. }));
        assert!(matches!(limiter.check_at("b", now), Decision::Allowed { .. }));
    }

    #[test]
    fn test_window_resets_after_elapsed() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), Decision::Limited { .. }));

        let next_window = now + Duration::from_secs(60);
        assert_eq!(limiter.check_at("a", next_window), Decision::Allowed { remaining: 0 });
    }

    #[test]
    fn test_prune_removes_stale_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10));
        let now = Instant::now();
        limiter.check_at("a", now);
        limiter.check_at("b", now + Duration::from_secs(8));
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.prune(now + Duration::from_secs(12));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    fn forwarded_request() -> Request<Body> {
        let peer: SocketAddr = ([198, 51, 100, 4], 40000).into();
        Request::builder()
            .uri("/api/assets")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_client_key_uses_peer_address_by_default() {
        assert_eq!(client_key(&forwarded_request(), false), "198.51.100.4");

        let bare = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_key(&bare, false), "unknown");
    }

    #[test]
    fn test_client_key_reads_forwarded_header_when_proxy_trusted() {
        assert_eq!(client_key(&forwarded_request(), true), "203.0.113.7");
    }
}
