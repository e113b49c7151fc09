//! Per-client-IP request limit for the `/api` routes.
//!
//! Each IP gets a burst of `max_requests`, refilled evenly over `window`.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota};
use tracing::{debug, warn};

use crate::{config::RateLimitConfig, error::ApiError, state::AppState};

pub struct RateLimiter {
    inner: DefaultKeyedRateLimiter<IpAddr>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> anyhow::Result<Self> {
        let burst = NonZeroU32::new(max_requests).context("RATE_LIMIT_MAX_REQUESTS must be > 0")?;
        let quota = Quota::with_period(window / burst.get())
            .context("RATE_LIMIT_WINDOW_SECS must be > 0")?
            .allow_burst(burst);
        Ok(Self {
            inner: governor::RateLimiter::keyed(quota),
        })
    }

    pub fn from_config(cfg: &RateLimitConfig) -> anyhow::Result<Self> {
        Self::new(cfg.max_requests, Duration::from_secs(cfg.window_secs))
    }

    /// Counts one request from `ip` and reports whether it is within the limit.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.inner.check_key(&ip).is_ok()
    }

    /// Forgets clients whose allowance is fully restored.
    pub fn prune(&self) {
        self.inner.retain_recent();
        self.inner.shrink_to_fit();
    }

    pub fn tracked_clients(&self) -> usize {
        self.inner.len()
    }
}

/// Prunes the limiter every `period` until the runtime shuts down.
pub fn spawn_pruner(limiter: Arc<RateLimiter>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            limiter.prune();
            debug!(clients = limiter.tracked_clients(), "rate limiter pruned");
        }
    });
}

pub async fn limit_by_ip(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.limiter.check(ip) {
        warn!(%ip, "rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(req).await
}
