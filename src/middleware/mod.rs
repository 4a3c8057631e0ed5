//! Built-in middleware stages.
//!
//! Each stage lives in its own file and implements the
//! [`Stage`](crate::Stage) contract. None of them know about each other;
//! the [`Pipeline`](crate::Pipeline) owns the order they run in.
//!
//! | Stage             | Inbound                              | Outbound              |
//! |-------------------|--------------------------------------|-----------------------|
//! | [`SecurityHeaders`] | —                                  | hardening headers     |
//! | [`Cors`]          | answers `OPTIONS` preflight          | `allow-origin` header |
//! | [`JsonBody`]      | parses JSON bodies, 400 on garbage   | —                     |
//! | [`Trace`]         | structured request log line          | —                     |
//! | [`RateLimit`]     | fixed-window throttle, 429 over limit| —                     |
//! | [`StaticFiles`]   | serves `/uploads/*`, 404 on traversal| —                     |

mod body;
mod cors;
mod rate_limit;
mod security;
mod static_files;
mod trace;

pub use body::JsonBody;
pub use cors::Cors;
pub use rate_limit::{RateLimit, RateLimiter};
pub use security::SecurityHeaders;
pub use static_files::StaticFiles;
pub use trace::Trace;
