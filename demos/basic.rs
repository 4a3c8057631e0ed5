//! The full bootstrap, assembled by hand.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/user
//!   curl http://localhost:3000/uploads/some-file.txt
//!   for i in $(seq 1 120); do curl -s -o /dev/null -w '%{http_code}\n' http://localhost:3000/; done
//!
//! `Pipeline::standard` would wire the same stages in one call; the manual
//! assembly here exists to keep a handle on the rate limiter so its
//! stale-bucket sweep can run in the background.

use std::sync::Arc;

use gantry::middleware::{Cors, JsonBody, RateLimit, RateLimiter, SecurityHeaders, StaticFiles, Trace};
use gantry::{handlers, Config, Method, Pipeline, Router, Server, UPLOADS_PREFIX};

#[tokio::main]
async fn main() -> Result<(), gantry::Error> {
    tracing_subscriber::fmt::init();

    let cfg = Config::from_env()?;

    let limiter = Arc::new(RateLimiter::new(cfg.rate_limit_window, cfg.rate_limit_max));
    spawn_bucket_sweeper(Arc::clone(&limiter), cfg.rate_limit_window);

    let router = Router::new()
        .on(Method::GET, "/",     handlers::health)
        .on(Method::GET, "/user", handlers::get_user);

    // Declared order: security → cors → body → trace → rate limit → static.
    let app = Pipeline::new(router)
        .stage(SecurityHeaders::new())
        .stage(Cors::permissive())
        .stage(JsonBody::new())
        .stage(Trace::new())
        .stage(RateLimit::new(limiter))
        .stage(StaticFiles::new(UPLOADS_PREFIX, cfg.upload_dir.clone()));

    let port = cfg.port.unwrap_or(3000);
    Server::bind(&format!("0.0.0.0:{port}")).serve(app).await
}

/// Evicts rate-limit buckets for IPs that went quiet, once per window.
fn spawn_bucket_sweeper(limiter: Arc<RateLimiter>, window: std::time::Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(window);
        loop {
            tick.tick().await;
            limiter.sweep_stale();
        }
    });
}
