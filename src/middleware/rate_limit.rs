//! Fixed-window rate limiting, keyed by client IP.
//!
//! The algorithm counts requests inside a fixed window per IP and resets
//! the count when the window elapses. This permits a burst of up to
//! `2 × max` straddling a window boundary — a documented property of
//! fixed-window limiting, accepted here for its O(1) state per client.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use http::StatusCode;
use tracing::warn;

use crate::pipeline::{Flow, Stage, StageFuture};
use crate::request::Request;
use crate::response::Response;

struct Bucket {
    count: u32,
    window_start: Instant,
}

/// What the limiter decided for one request.
#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Over the limit; `retry_after` is the time left in the window.
    Limited { retry_after: Duration },
}

/// Per-IP fixed-window request limiter.
///
/// An explicit value — owned by whoever assembles the pipeline and injected
/// into the [`RateLimit`] stage — so multiple servers can carry independent
/// limiters and tests never share state through a global.
///
/// The bucket map is a [`DashMap`]; its entry API holds a per-key lock
/// across the whole check-then-increment, so concurrent requests from one
/// IP cannot both observe the same count.
pub struct RateLimiter {
    buckets: DashMap<IpAddr, Bucket>,
    window: Duration,
    max: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self { buckets: DashMap::new(), window, max }
    }

    /// Records one request from `ip` and decides whether to allow it.
    pub fn check(&self, ip: IpAddr) -> Decision {
        self.check_at(ip, Instant::now())
    }

    /// Window arithmetic against an explicit clock, so tests can walk a
    /// timeline without sleeping.
    fn check_at(&self, ip: IpAddr, now: Instant) -> Decision {
        let mut bucket = self
            .buckets
            .entry(ip)
            .or_insert(Bucket { count: 0, window_start: now });

        if now.duration_since(bucket.window_start) >= self.window {
            // Window elapsed: this request opens a fresh one.
            bucket.count = 1;
            bucket.window_start = now;
            return Decision::Allowed;
        }

        bucket.count += 1;
        if bucket.count > self.max {
            let elapsed = now.duration_since(bucket.window_start);
            Decision::Limited { retry_after: self.window.saturating_sub(elapsed) }
        } else {
            Decision::Allowed
        }
    }

    /// Drops buckets whose window has fully elapsed. Without this the map
    /// grows by one entry per IP ever seen; run it periodically (the demo
    /// uses a tokio interval).
    pub fn sweep_stale(&self) {
        let now = Instant::now();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.window_start) < self.window);
    }

    /// Number of IPs currently tracked.
    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }
}

/// The rate-limiting stage: consults the injected [`RateLimiter`] and
/// short-circuits over-limit requests with `429` plus a retry hint.
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Convenience constructor when nothing else needs the limiter handle.
    pub fn with_limits(window: Duration, max: u32) -> Self {
        Self::new(Arc::new(RateLimiter::new(window, max)))
    }
}

impl Stage for RateLimit {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    fn handle(&self, req: Request) -> StageFuture {
        let decision = self.limiter.check(req.client_ip());
        Box::pin(async move {
            match decision {
                Decision::Allowed => Flow::Next(req),
                Decision::Limited { retry_after } => {
                    let secs = (retry_after.as_millis() as u64).div_ceil(1000).max(1);
                    warn!(client = %req.client_ip(), retry_after_secs = secs, "rate limit exceeded");
                    let body = serde_json::to_vec(&serde_json::json!({
                        "error": format!("too many requests, retry in {secs}s"),
                    }))
                    .unwrap_or_default();
                    Flow::Halt(
                        Response::builder()
                            .status(StatusCode::TOO_MANY_REQUESTS)
                            .header("retry-after", &secs.to_string())
                            .json(body),
                    )
                }
            }
        })
    }
}
