use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{decode_token, token_from_headers},
    state::AppState,
};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter per client key.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    hits: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: DashMap::new(),
        }
    }

    pub fn check(&self, key: &str) -> AppResult<()> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> AppResult<()> {
        let mut entry = self.hits.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.max {
            return Err(AppError::RateLimited);
        }
        entry.count += 1;
        Ok(())
    }

    /// Drops windows that have already expired. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let before = self.hits.len();
        self.hits
            .retain(|_, w| now.duration_since(w.started) < self.window);
        before.saturating_sub(self.hits.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.hits.len()
    }
}

fn client_ip(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Keys on client IP, or IP plus user id when the request carries a valid token.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&req);
    let key = match token_from_headers(req.headers())
        .and_then(|token| decode_token(&token, &state.config.jwt_secret).ok())
    {
        Some(user) => format!("{ip}:{}", user.user_id),
        None => ip,
    };

    if let Err(err) = state.limiter.check(&key) {
        tracing::warn!(%key, "rate limit exceeded");
        return Err(err);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("1.2.3.4", now).is_ok());
        assert!(limiter.check_at("1.2.3.4", now).is_ok());
        assert!(matches!(
            limiter.check_at("1.2.3.4", now),
            Err(AppError::RateLimited)
        ));
        assert!(limiter.check_at("5.6.7.8", now).is_ok());
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start).is_err());
        assert!(limiter.check_at("k", start + Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn prune_drops_expired_windows() {
        let limiter = RateLimiter::new(5, Duration::from_millis(0));
        limiter.check("a").unwrap();
        limiter.check("b").unwrap();
        assert_eq!(limiter.prune(), 2);
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
