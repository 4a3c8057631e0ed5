//! JSON body parsing.

use http::StatusCode;
use tracing::debug;

use crate::pipeline::{Flow, Stage, StageFuture};
use crate::request::Request;
use crate::response::Response;

/// Parses JSON request bodies ahead of the handlers.
///
/// When the request declares `content-type: application/json` and carries a
/// non-empty body, the parsed document is attached as an annotation —
/// handlers read it via [`Request::json`]. Anything else passes through
/// untouched; handlers that want raw bytes still have [`Request::body`].
///
/// A declared-JSON body that fails to parse is answered with `400` here,
/// so no handler ever sees a half-valid JSON request.
pub struct JsonBody;

impl JsonBody {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonBody {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for JsonBody {
    fn name(&self) -> &'static str {
        "json-body"
    }

    fn handle(&self, req: Request) -> StageFuture {
        Box::pin(async move {
            let declares_json = req
                .header("content-type")
                .is_some_and(|ct| ct.trim_start().starts_with("application/json"));

            if !declares_json || req.body().is_empty() {
                return Flow::Next(req);
            }

            match serde_json::from_slice(req.body()) {
                Ok(value) => Flow::Next(req.with_json(value)),
                Err(e) => {
                    debug!(path = req.path(), "rejecting malformed json body: {e}");
                    Flow::Halt(Response::error_json(StatusCode::BAD_REQUEST, "Bad Request"))
                }
            }
        })
    }
}
