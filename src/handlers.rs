//! Built-in terminal handlers.
//!
//! The pipeline needs something to dispatch to; these are the two endpoints
//! the bootstrap registers. Register them on your router:
//!
//! ```rust,no_run
//! use gantry::{handlers, Method, Router};
//!
//! let router = Router::new()
//!     .on(Method::GET, "/",     handlers::health)
//!     .on(Method::GET, "/user", handlers::get_user);
//! ```

use serde::Serialize;

use crate::request::Request;
use crate::response::Response;

// Field order is serialization order; these shapes are part of the HTTP
// contract, so they are structs rather than ad-hoc maps.

#[derive(Serialize)]
struct HealthPayload {
    ok: bool,
    pid: u32,
}

#[derive(Serialize)]
struct UserPayload {
    success: bool,
    message: &'static str,
}

/// `GET /` — liveness. Answers regardless of routing or rate-limit state of
/// anything else; if the process can respond at all, it responds here.
pub async fn health(_req: Request) -> Response {
    let payload = HealthPayload { ok: true, pid: std::process::id() };
    Response::json(serde_json::to_vec(&payload).unwrap_or_default())
}

/// `GET /user` — the illustrative stub handler. No domain logic, fixed
/// success payload; failures are owned by the pipeline's 500 responder.
pub async fn get_user(_req: Request) -> Response {
    let payload = UserPayload {
        success: true,
        message: "the user fetched successfully",
    };
    Response::json(serde_json::to_vec(&payload).unwrap_or_default())
}
