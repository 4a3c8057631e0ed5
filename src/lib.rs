//! # gantry
//!
//! A minimal HTTP server bootstrap built around one idea: every request
//! walks the same explicit, ordered middleware pipeline before any handler
//! runs.
//!
//! ## The pipeline
//!
//! ```text
//! security headers → CORS → body parsing → request logging
//!     → rate limiting → static files (/uploads) → router → 404
//! ```
//!
//! Each stage is a value implementing [`Stage`] and answers with a typed
//! [`Flow`]: forward the request (possibly annotated) or short-circuit with
//! a response. No next-callback convention, no hidden ordering — the
//! assembly is a list you can read, and [`Pipeline::stage_names`] lets a
//! test pin it down without binding a socket.
//!
//! Expected failures are owned by the stage that knows about them (429 by
//! the rate limiter, 404 by the static server and router); anything
//! unexpected is caught at the dispatch boundary and answered with a
//! generic 500 that leaks nothing.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gantry::{handlers, Config, Method, Pipeline, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gantry::Error> {
//!     let cfg = Config::from_env()?;
//!
//!     let router = Router::new()
//!         .on(Method::GET, "/",     handlers::health)
//!         .on(Method::GET, "/user", handlers::get_user);
//!
//!     let port = cfg.port.unwrap_or(3000);
//!     Server::bind(&format!("0.0.0.0:{port}"))
//!         .serve(Pipeline::standard(&cfg, router))
//!         .await
//! }
//! ```
//!
//! Configuration comes from the environment (`PORT`,
//! `RATE_LIMIT_WINDOW_MS`, `RATE_LIMIT_MAX`, `UPLOAD_DIR`) — see
//! [`Config`]. `demos/basic.rs` shows the manual assembly, including the
//! rate limiter's stale-bucket sweep.

mod config;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod router;
mod server;

pub mod handlers;
pub mod middleware;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use http::{Method, StatusCode};
pub use pipeline::{Flow, Pipeline, Stage, StageFuture, UPLOADS_PREFIX};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
